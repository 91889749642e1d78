//! BOM 정규화/보정 벤치마크
//!
//! CycloneDX 문서 정규화, lockfile 인덱스 생성, 체크섬 보정 성능을 측정합니다.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use modbom_builder::{ChecksumReconciler, PackageLock, parse_document};

/// n개 컴포넌트를 가진 CycloneDX 문서. 짝수 번째만 해시를 가짐
fn generate_document(n: usize) -> String {
    let components: Vec<String> = (0..n)
        .map(|i| {
            let hashes = if i % 2 == 0 {
                format!(r#"[{{"alg":"SHA-1","content":"{:040x}"}}]"#, i)
            } else {
                "[]".to_owned()
            };
            format!(
                r#"{{"type":"library","name":"pkg-{i}","version":"1.{i}.0","purl":"pkg:npm/pkg-{i}@1.{i}.0","hashes":{hashes},"licenses":[{{"license":{{"id":"MIT"}}}}]}}"#
            )
        })
        .collect();
    format!(r#"{{"bomFormat":"CycloneDX","components":[{}]}}"#, components.join(","))
}

/// n개 의존성을 가진 v1 package-lock.json
fn generate_lockfile(n: usize) -> String {
    let deps: Vec<String> = (0..n)
        .map(|i| format!(r#""pkg-{i}":{{"version":"1.{i}.0","integrity":"sha512-YWJjZGU="}}"#))
        .collect();
    format!(
        r#"{{"name":"app","lockfileVersion":1,"dependencies":{{{}}}}}"#,
        deps.join(",")
    )
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for n in [10usize, 1000] {
        let doc = generate_document(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("components_{n}"), |b| {
            b.iter(|| parse_document(black_box(&doc)).unwrap())
        });
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    let lockfile = generate_lockfile(1000);
    group.throughput(Throughput::Elements(1000));
    group.bench_function("index_1000", |b| {
        b.iter(|| PackageLock::parse(black_box(&lockfile)).unwrap().index())
    });

    let records = parse_document(&generate_document(1000)).unwrap();
    let index = PackageLock::parse(&lockfile).unwrap().index();
    group.bench_function("reconcile_1000", |b| {
        b.iter(|| {
            ChecksumReconciler::with_index(index.clone())
                .reconcile(black_box(records.clone()))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_reconcile);
criterion_main!(benches);

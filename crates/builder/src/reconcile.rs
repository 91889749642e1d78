//! 체크섬 보정
//!
//! 스캐너가 해시를 주지 않은 레코드에 lockfile의 integrity 값을 채워 넣습니다.
//! I/O에는 관대하고 데이터에는 엄격합니다. lockfile이 없으면 경고만 남기고
//! 넘어가지만, 알 수 없는 알고리즘이나 base64가 아닌 해시는 전체 보정을 실패시킵니다.

use std::cell::OnceCell;
use std::path::PathBuf;

use metrics::counter;
use tracing::{debug, warn};

use modbom_core::metrics::CHECKSUMS_RECONCILED_TOTAL;
use modbom_core::types::ProvenanceRecord;

use crate::error::BuildError;
use crate::lockfile::{IntegrityIndex, PackageLock};

/// lockfile 기반 체크섬 보정기
///
/// integrity 인덱스는 처음 필요할 때 한 번만 만들어집니다.
/// 한 번의 generate 호출 동안만 사용하고 버립니다.
#[derive(Debug)]
pub struct ChecksumReconciler {
    lockfile_path: PathBuf,
    max_file_size: usize,
    /// `None`이면 lockfile을 쓸 수 없음
    index: OnceCell<Option<IntegrityIndex>>,
}

impl ChecksumReconciler {
    pub fn new(lockfile_path: impl Into<PathBuf>, max_file_size: usize) -> Self {
        Self {
            lockfile_path: lockfile_path.into(),
            max_file_size,
            index: OnceCell::new(),
        }
    }

    /// 이미 만들어진 인덱스로 보정기를 생성합니다.
    pub fn with_index(index: IntegrityIndex) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(Some(index));
        Self {
            lockfile_path: PathBuf::new(),
            max_file_size: 0,
            index: cell,
        }
    }

    /// 인덱스가 만들어졌는지 반환합니다.
    pub fn is_index_loaded(&self) -> bool {
        self.index.get().is_some()
    }

    fn index(&self) -> Option<&IntegrityIndex> {
        self.index
            .get_or_init(|| match PackageLock::load(&self.lockfile_path, self.max_file_size) {
                Ok(lock) => {
                    let index = lock.index();
                    debug!(
                        path = %self.lockfile_path.display(),
                        entries = index.len(),
                        "integrity index built"
                    );
                    Some(index)
                }
                Err(e) => {
                    warn!(error = %e, "continuing without lockfile checksums");
                    None
                }
            })
            .as_ref()
    }

    /// 체크섬이 없는 레코드를 lockfile로 보정합니다.
    ///
    /// 이미 체크섬이 있는 레코드는 그대로 통과합니다.
    pub fn reconcile(
        &self,
        records: Vec<ProvenanceRecord>,
    ) -> Result<Vec<ProvenanceRecord>, BuildError> {
        let mut filled = 0u64;
        let mut out = Vec::with_capacity(records.len());

        for mut record in records {
            if record.checksum.is_none() {
                if let Some(index) = self.index() {
                    record.checksum = index.find_checksum(&record.name)?;
                    if record.checksum.is_some() {
                        filled += 1;
                    }
                }
            }
            out.push(record);
        }

        if filled > 0 {
            debug!(filled, "checksums reconciled from lockfile");
            counter!(CHECKSUMS_RECONCILED_TOTAL).increment(filled);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modbom_core::types::{Checksum, ChecksumAlgorithm};

    fn record(name: &str) -> ProvenanceRecord {
        ProvenanceRecord::new(name, "1.0.0")
    }

    fn write_lock(dir: &std::path::Path, content: &str) -> PathBuf {
        let path = dir.join("package-lock.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn fills_missing_checksum_from_lockfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_lock(
            dir.path(),
            r#"{"dependencies":{"leftpad":{"integrity":"sha256-YWJjZGU="}}}"#,
        );
        let reconciler = ChecksumReconciler::new(path, 1024);
        let out = reconciler.reconcile(vec![record("leftpad")]).unwrap();
        assert_eq!(
            out[0].checksum,
            Some(Checksum::new(ChecksumAlgorithm::Sha256, "6162636465"))
        );
    }

    #[test]
    fn existing_checksum_passes_through_without_loading() {
        let reconciler = ChecksumReconciler::new("/nonexistent/package-lock.json", 1024);
        let mut r = record("leftpad");
        r.checksum = Some(Checksum::new(ChecksumAlgorithm::Sha1, "86b1"));
        let out = reconciler.reconcile(vec![r.clone()]).unwrap();
        assert_eq!(out, vec![r]);
        assert!(!reconciler.is_index_loaded());
    }

    #[test]
    fn missing_lockfile_leaves_checksums_absent() {
        let reconciler = ChecksumReconciler::new("/nonexistent/package-lock.json", 1024);
        let out = reconciler
            .reconcile(vec![record("a"), record("b")])
            .unwrap();
        assert!(out.iter().all(|r| r.checksum.is_none()));
        assert!(reconciler.is_index_loaded());
    }

    #[test]
    fn unknown_algorithm_fails_reconciliation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_lock(
            dir.path(),
            r#"{"dependencies":{"x":{"integrity":"randomAlgorithm-YWJj"}}}"#,
        );
        let err = ChecksumReconciler::new(path, 1024)
            .reconcile(vec![record("x")])
            .unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedAlgorithm(ref n) if n == "randomAlgorithm"));
    }

    #[test]
    fn invalid_base64_integrity_fails_reconciliation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_lock(
            dir.path(),
            r#"{"dependencies":{"leftpad":{"integrity":"sha256-%%"}}}"#,
        );
        let reconciler = ChecksumReconciler::new(path, 1024);
        let err = reconciler
            .reconcile(vec![record("leftpad")])
            .unwrap_err();
        assert!(matches!(err, BuildError::Decode { .. }));
        assert!(err.to_string().contains("package leftpad"));
    }

    #[test]
    fn integrity_without_delimiter_stays_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_lock(dir.path(), r#"{"dependencies":{"x":{"integrity":"abc"}}}"#);
        let out = ChecksumReconciler::new(path, 1024)
            .reconcile(vec![record("x")])
            .unwrap();
        assert_eq!(out[0].checksum, None);
    }

    #[test]
    fn index_is_built_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_lock(
            dir.path(),
            r#"{"dependencies":{"a":{"integrity":"sha1-YQ=="}}}"#,
        );
        let reconciler = ChecksumReconciler::new(&path, 1024);
        reconciler.reconcile(vec![record("a")]).unwrap();

        // 파일을 지워도 이미 만든 인덱스를 계속 사용
        std::fs::remove_file(&path).unwrap();
        let out = reconciler.reconcile(vec![record("a")]).unwrap();
        assert_eq!(
            out[0].checksum,
            Some(Checksum::new(ChecksumAlgorithm::Sha1, "61"))
        );
    }

    #[test]
    fn with_index_skips_file_io() {
        let index = PackageLock::parse(r#"{"dependencies":{"a":{"integrity":"sha512-YQ=="}}}"#)
            .unwrap()
            .index();
        let out = ChecksumReconciler::with_index(index)
            .reconcile(vec![record("a"), record("unknown")])
            .unwrap();
        assert_eq!(
            out[0].checksum,
            Some(Checksum::new(ChecksumAlgorithm::Sha512, "61"))
        );
        assert_eq!(out[1].checksum, None);
    }
}

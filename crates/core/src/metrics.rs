//! 메트릭 상수 및 설명 등록
//!
//! 파이프라인이 기록하는 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 단계는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `modbom_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(modbom_core::metrics::SCANS_TOTAL, "result" => "success").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, failure, reuse, rebuild)
pub const LABEL_RESULT: &str = "result";

/// 파이프라인 단계 레이블 키
pub const LABEL_STAGE: &str = "stage";

// ─── 캐시 메트릭 ───────────────────────────────────────────────────

/// 캐시 판정 수 (counter, label: result=reuse|rebuild)
pub const CACHE_DECISIONS_TOTAL: &str = "modbom_cache_decisions_total";

/// 레이어 초기화 수 (counter)
pub const CACHE_RESETS_TOTAL: &str = "modbom_cache_resets_total";

// ─── 스캔/정규화 메트릭 ────────────────────────────────────────────

/// 스캐너 실행 수 (counter, label: result)
pub const SCANS_TOTAL: &str = "modbom_scans_total";

/// 스캐너 실행 시간 (histogram, 초)
pub const SCAN_DURATION_SECONDS: &str = "modbom_scan_duration_seconds";

/// 정규화된 컴포넌트 수 (counter)
pub const COMPONENTS_NORMALIZED_TOTAL: &str = "modbom_components_normalized_total";

/// lockfile에서 체크섬을 채운 컴포넌트 수 (counter)
pub const CHECKSUMS_RECONCILED_TOTAL: &str = "modbom_checksums_reconciled_total";

// ─── 파이프라인 메트릭 ─────────────────────────────────────────────

/// 빌드 실행 수 (counter, label: result)
pub const BUILDS_TOTAL: &str = "modbom_builds_total";

/// 빌드 중단 수 (counter, label: stage)
pub const BUILD_ABORTS_TOTAL: &str = "modbom_build_aborts_total";

/// 빌드 전체 소요 시간 (histogram, 초)
pub const BUILD_DURATION_SECONDS: &str = "modbom_build_duration_seconds";

/// 모든 메트릭의 설명을 등록합니다.
///
/// recorder가 설치되지 않은 상태에서 호출해도 안전합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        CACHE_DECISIONS_TOTAL,
        "Cache layer decisions by result (reuse, rebuild)"
    );
    describe_counter!(
        CACHE_RESETS_TOTAL,
        "Number of times the cache layer was wiped before a rebuild"
    );
    describe_counter!(SCANS_TOTAL, "Component scanner invocations by result");
    describe_histogram!(
        SCAN_DURATION_SECONDS,
        "Component scanner wall-clock duration in seconds"
    );
    describe_counter!(
        COMPONENTS_NORMALIZED_TOTAL,
        "Components converted into provenance records"
    );
    describe_counter!(
        CHECKSUMS_RECONCILED_TOTAL,
        "Provenance records whose checksum was filled from the lockfile"
    );
    describe_counter!(BUILDS_TOTAL, "Build pipeline runs by result");
    describe_counter!(BUILD_ABORTS_TOTAL, "Build pipeline aborts by failing stage");
    describe_histogram!(
        BUILD_DURATION_SECONDS,
        "Build pipeline wall-clock duration in seconds"
    );
}

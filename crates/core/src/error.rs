//! 에러 타입 -- 도메인별 에러 정의

/// modbom 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ModbomError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// BOM 생성 파이프라인 에러
    #[error("bom error: {0}")]
    Bom(#[from] BomError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// BOM 생성 관련 에러
///
/// 빌더 크레이트의 상세 에러가 이 분류로 축약되어 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum BomError {
    /// 캐시 레이어 초기화 실패
    #[error("cache reset failed: {0}")]
    CacheReset(String),

    /// 외부 스캐너 실행 실패
    #[error("scan failed: {0}")]
    ScanFailed(String),

    /// 스캐너 출력 또는 lockfile 형식 위반
    #[error("decode failed: {0}")]
    Decode(String),

    /// 지원하지 않는 체크섬 알고리즘
    #[error("failed to get supported BOM checksum algorithm: {0} is not valid")]
    UnsupportedAlgorithm(String),

    /// 도구 의존성 해석/설치 실패
    #[error("dependency error: {0}")]
    Dependency(String),
}

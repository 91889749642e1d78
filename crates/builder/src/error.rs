//! BOM 빌더 에러 타입
//!
//! [`BuildError`]는 빌드 파이프라인 안에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<BuildError> for ModbomError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **캐시 레이어**: `CacheReset`
//! - **스캐너 실행**: `ScanExecution`
//! - **데이터 계약**: `Decode`, `UnsupportedAlgorithm`
//! - **lockfile**: `LockfileUnavailable` (치명적이지 않음, 보정 단계에서 흡수)
//! - **도구 의존성**: `DependencyResolve`, `DependencyInstall`
//! - **설정 / 파일 I/O**: `Config`, `Io`

use modbom_core::error::{BomError, ConfigError, ModbomError};

/// BOM 빌더 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// 캐시 레이어 초기화 실패
    #[error("failed to reset cache layer: {path}: {source}")]
    CacheReset {
        /// 레이어 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 외부 스캐너 실행 실패
    ///
    /// `diagnostics`에는 스캐너의 stdout/stderr가 그대로 담깁니다.
    #[error("failed to run {command}: {reason}")]
    ScanExecution {
        /// 실행한 명령
        command: String,
        /// 캡처된 출력
        diagnostics: String,
        /// 실패 원인
        reason: String,
    },

    /// 스캐너 출력 해석 실패
    #[error("failed to decode {path}: {reason}")]
    Decode {
        /// 대상 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// lockfile을 읽을 수 없음
    #[error("lockfile unavailable: {path}: {reason}")]
    LockfileUnavailable {
        /// lockfile 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 지원하지 않는 체크섬 알고리즘
    #[error("failed to get supported BOM checksum algorithm: {0} is not valid")]
    UnsupportedAlgorithm(String),

    /// 매니페스트에서 도구 의존성을 찾지 못함
    #[error("failed to resolve dependency: {0}")]
    DependencyResolve(String),

    /// 도구 설치 실패
    #[error("failed to install dependency {name}: {reason}")]
    DependencyInstall {
        /// 의존성 ID
        name: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl BuildError {
    /// 파이프라인을 중단시켜야 하는 에러인지 반환합니다.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::LockfileUnavailable { .. })
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl From<BuildError> for ModbomError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::CacheReset { path, source } => {
                ModbomError::Bom(BomError::CacheReset(format!("{path}: {source}")))
            }
            e @ BuildError::ScanExecution { .. } => {
                ModbomError::Bom(BomError::ScanFailed(e.to_string()))
            }
            e @ (BuildError::Decode { .. } | BuildError::LockfileUnavailable { .. }) => {
                ModbomError::Bom(BomError::Decode(e.to_string()))
            }
            BuildError::UnsupportedAlgorithm(name) => {
                ModbomError::Bom(BomError::UnsupportedAlgorithm(name))
            }
            e @ (BuildError::DependencyResolve(_) | BuildError::DependencyInstall { .. }) => {
                ModbomError::Bom(BomError::Dependency(e.to_string()))
            }
            BuildError::Config { field, reason } => {
                ModbomError::Config(ConfigError::InvalidValue { field, reason })
            }
            BuildError::Io { path, source } => ModbomError::Io(std::io::Error::new(
                source.kind(),
                format!("{path}: {source}"),
            )),
        }
    }
}

//! 설정 관리 -- modbom.toml 파싱 및 런타임 설정
//!
//! [`ModbomConfig`]는 로깅과 BOM 파이프라인 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`MODBOM_BOM_LAYER_NAME=tools` 형식, 플랫폼 스위치 `BP_DISABLE_SBOM`)
//! 3. 설정 파일 (`modbom.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), modbom_core::error::ModbomError> {
//! use modbom_core::config::ModbomConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ModbomConfig::load("modbom.toml").await?;
//!
//! // 파일 없이 기본값 + 환경변수
//! let config = ModbomConfig::from_env()?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ModbomConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ModbomError};

/// SBOM 생성을 끄는 플랫폼 환경변수
pub const DISABLE_SBOM_ENV: &str = "BP_DISABLE_SBOM";

/// layers 디렉토리에서 `<name>.toml`이 다른 용도로 쓰이는 예약 이름
pub const RESERVED_LAYER_NAMES: &[&str] = &["build", "launch", "store"];

/// modbom 통합 설정
///
/// `modbom.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModbomConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// BOM 파이프라인 설정
    #[serde(default)]
    pub bom: BomConfig,
}

impl ModbomConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ModbomError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일 없이 기본값에 환경변수 오버라이드만 적용합니다.
    pub fn from_env() -> Result<Self, ModbomError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ModbomError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ModbomError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ModbomError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ModbomError> {
        toml::from_str(toml_str).map_err(|e| {
            ModbomError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `MODBOM_{SECTION}_{FIELD}`
    ///
    /// `BP_DISABLE_SBOM`은 플랫폼이 넘겨주는 스위치라서 잘못된 값을 무시하지 않고
    /// 에러로 돌려줍니다. 나머지 항목은 파싱 실패 시 경고만 남깁니다.
    pub fn apply_env_overrides(&mut self) -> Result<(), ModbomError> {
        // General
        override_string(&mut self.general.log_level, "MODBOM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "MODBOM_GENERAL_LOG_FORMAT");

        // BOM
        override_bool(&mut self.bom.disable_sbom, "MODBOM_BOM_DISABLE_SBOM");
        override_string(&mut self.bom.scanner_command, "MODBOM_BOM_SCANNER_COMMAND");
        override_string(&mut self.bom.layer_name, "MODBOM_BOM_LAYER_NAME");
        override_string(&mut self.bom.tool_id, "MODBOM_BOM_TOOL_ID");
        override_string(&mut self.bom.tool_version, "MODBOM_BOM_TOOL_VERSION");
        override_usize(&mut self.bom.max_file_size, "MODBOM_BOM_MAX_FILE_SIZE");

        override_strict_bool(&mut self.bom.disable_sbom, DISABLE_SBOM_ENV, "bom.disable_sbom")?;
        Ok(())
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ModbomError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.bom.scanner_command.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "bom.scanner_command".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        // 레이어 이름은 layers 디렉토리 바로 아래 경로 한 칸이어야 함
        let layer = &self.bom.layer_name;
        if layer.is_empty() || layer.contains('/') || layer.contains('\\') || layer.contains("..")
        {
            return Err(ConfigError::InvalidValue {
                field: "bom.layer_name".to_owned(),
                reason: "must be a single non-empty path segment".to_owned(),
            }
            .into());
        }
        if RESERVED_LAYER_NAMES.contains(&layer.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "bom.layer_name".to_owned(),
                reason: format!("'{layer}' is a reserved layer name"),
            }
            .into());
        }

        if self.bom.tool_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "bom.tool_id".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.bom.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bom.max_file_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// BOM 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BomConfig {
    /// SBOM 생성 비활성화 (`BP_DISABLE_SBOM`)
    pub disable_sbom: bool,
    /// 컴포넌트 스캐너 실행 파일 이름
    pub scanner_command: String,
    /// 도구가 설치되는 캐시 레이어 이름
    pub layer_name: String,
    /// 매니페스트에서 찾을 도구 의존성 ID
    pub tool_id: String,
    /// 도구 버전 제약 (`*`는 최신)
    pub tool_version: String,
    /// 스캐너 출력 파일 최대 크기 (바이트)
    pub max_file_size: usize,
}

impl Default for BomConfig {
    fn default() -> Self {
        Self {
            disable_sbom: false,
            scanner_command: "cyclonedx-bom".to_owned(),
            layer_name: "cyclonedx-node-module".to_owned(),
            tool_id: "cyclonedx-node-module".to_owned(),
            tool_version: "*".to_owned(),
            max_file_size: 50 * 1024 * 1024, // 50 MB
        }
    }
}

/// 플랫폼 불리언 문자열을 해석합니다.
///
/// `1, t, T, TRUE, true, True, 0, f, F, FALSE, false, False`만 허용합니다.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match parse_flag(&val) {
            Some(parsed) => *target = parsed,
            None => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_strict_bool(target: &mut bool, env_key: &str, field: &str) -> Result<(), ModbomError> {
    let Ok(val) = std::env::var(env_key) else {
        return Ok(());
    };
    match parse_flag(&val) {
        Some(parsed) => {
            *target = parsed;
            Ok(())
        }
        None => Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: format!("{env_key}={val:?} is not a valid boolean"),
        }
        .into()),
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

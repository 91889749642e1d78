//! BOM 빌더 설정
//!
//! [`BuilderConfig`]는 core의 [`BomConfig`](modbom_core::config::BomConfig)를
//! 확장하여 빌더 고유 설정(스캐너 출력 파일명, lockfile 이름, 매니페스트 이름)을 추가합니다.
//!
//! # 사용 예시
//!
//! ```
//! use modbom_builder::{BuilderConfig, BuilderConfigBuilder};
//!
//! let config = BuilderConfig::default();
//! config.validate().unwrap();
//!
//! let config = BuilderConfigBuilder::new()
//!     .disable_sbom(true)
//!     .layer_name("tools")
//!     .build()
//!     .unwrap();
//! assert!(config.disable_sbom);
//! ```

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use modbom_core::config::RESERVED_LAYER_NAMES;

use crate::error::BuildError;

/// 파일 크기 상한 (1 GB)
const MAX_FILE_SIZE_LIMIT: usize = 1024 * 1024 * 1024;

/// BOM 빌더 설정
///
/// - **disable_sbom**: 켜져 있으면 스캔/정규화/보정을 건너뛰고 빈 BOM을 만듭니다
/// - **scanner_command**: 컴포넌트 스캐너 실행 파일
/// - **output_file**: 스캐너가 작업 디렉토리에 쓰는 결과 파일명
/// - **lockfile_name**: integrity 정보를 읽을 lockfile 이름
/// - **manifest_name**: 도구 의존성 목록이 담긴 매니페스트 파일명
/// - **layer_name**: 도구를 설치하는 캐시 레이어 이름
/// - **tool_id** / **tool_version**: 매니페스트에서 찾을 도구와 버전 제약
/// - **max_file_size**: 스캐너 출력과 lockfile의 최대 크기
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    pub disable_sbom: bool,
    pub scanner_command: String,
    pub output_file: String,
    pub lockfile_name: String,
    pub manifest_name: String,
    pub layer_name: String,
    pub tool_id: String,
    pub tool_version: String,
    pub max_file_size: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            disable_sbom: false,
            scanner_command: "cyclonedx-bom".to_owned(),
            output_file: "bom.json".to_owned(),
            lockfile_name: "package-lock.json".to_owned(),
            manifest_name: "buildpack.toml".to_owned(),
            layer_name: "cyclonedx-node-module".to_owned(),
            tool_id: "cyclonedx-node-module".to_owned(),
            tool_version: "*".to_owned(),
            max_file_size: 50 * 1024 * 1024, // 50 MB
        }
    }
}

impl BuilderConfig {
    /// core의 `BomConfig`에서 빌더 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값을 사용합니다.
    pub fn from_core(core: &modbom_core::config::BomConfig) -> Self {
        Self {
            disable_sbom: core.disable_sbom,
            scanner_command: core.scanner_command.clone(),
            layer_name: core.layer_name.clone(),
            tool_id: core.tool_id.clone(),
            tool_version: core.tool_version.clone(),
            max_file_size: core.max_file_size,
            ..Self::default()
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// 파일명 필드는 모두 작업 디렉토리 바로 아래 한 칸이어야 합니다.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.scanner_command.trim().is_empty() {
            return Err(BuildError::Config {
                field: "scanner_command".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        for (field, value) in [
            ("output_file", &self.output_file),
            ("lockfile_name", &self.lockfile_name),
            ("manifest_name", &self.manifest_name),
            ("layer_name", &self.layer_name),
        ] {
            validate_file_name(field, value)?;
        }

        // build.toml, launch.toml과 겹치면 persist가 레이어 메타데이터를 덮어씀
        if RESERVED_LAYER_NAMES.contains(&self.layer_name.as_str()) {
            return Err(BuildError::Config {
                field: "layer_name".to_owned(),
                reason: format!("'{}' is a reserved layer name", self.layer_name),
            });
        }

        if self.tool_id.is_empty() {
            return Err(BuildError::Config {
                field: "tool_id".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.tool_version.is_empty() {
            return Err(BuildError::Config {
                field: "tool_version".to_owned(),
                reason: "must not be empty, use '*' for any version".to_owned(),
            });
        }

        if self.max_file_size == 0 || self.max_file_size > MAX_FILE_SIZE_LIMIT {
            return Err(BuildError::Config {
                field: "max_file_size".to_owned(),
                reason: format!("must be 1-{MAX_FILE_SIZE_LIMIT}"),
            });
        }

        Ok(())
    }
}

fn validate_file_name(field: &str, value: &str) -> Result<(), BuildError> {
    let mut components = Path::new(value).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if value.is_empty() || !single_normal {
        return Err(BuildError::Config {
            field: field.to_owned(),
            reason: format!("'{value}' must be a single file name without directories"),
        });
    }
    Ok(())
}

/// [`BuilderConfig`] 빌더
///
/// 빌드 시 유효성 검증을 수행합니다.
#[derive(Default)]
pub struct BuilderConfigBuilder {
    config: BuilderConfig,
}

impl BuilderConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// SBOM 생성 비활성화 여부를 설정합니다.
    pub fn disable_sbom(mut self, disable: bool) -> Self {
        self.config.disable_sbom = disable;
        self
    }

    /// 스캐너 실행 파일을 설정합니다.
    pub fn scanner_command(mut self, command: impl Into<String>) -> Self {
        self.config.scanner_command = command.into();
        self
    }

    /// 스캐너 출력 파일명을 설정합니다.
    pub fn output_file(mut self, name: impl Into<String>) -> Self {
        self.config.output_file = name.into();
        self
    }

    /// lockfile 이름을 설정합니다.
    pub fn lockfile_name(mut self, name: impl Into<String>) -> Self {
        self.config.lockfile_name = name.into();
        self
    }

    /// 매니페스트 파일명을 설정합니다.
    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.config.manifest_name = name.into();
        self
    }

    /// 캐시 레이어 이름을 설정합니다.
    pub fn layer_name(mut self, name: impl Into<String>) -> Self {
        self.config.layer_name = name.into();
        self
    }

    /// 도구 의존성 ID와 버전 제약을 설정합니다.
    pub fn tool(mut self, id: impl Into<String>, version: impl Into<String>) -> Self {
        self.config.tool_id = id.into();
        self.config.tool_version = version.into();
        self
    }

    /// 최대 파일 크기(바이트)를 설정합니다.
    pub fn max_file_size(mut self, size: usize) -> Self {
        self.config.max_file_size = size;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `BuildError::Config` 반환
    pub fn build(self) -> Result<BuilderConfig, BuildError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

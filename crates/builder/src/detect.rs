//! 빌드 계획 탐지
//!
//! 이 단계가 실행되려면 `node`가 빌드 시점에 필요합니다.
//! 작업 디렉토리에 `node_modules`가 아직 없으면, 그것을 만들어 줄 단계도 요구합니다.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::BuildError;

/// 빌드 계획 요구 사항
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub name: String,
    /// 빌드 시점에 필요한지
    pub build: bool,
}

impl Requirement {
    fn build_time(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            build: true,
        }
    }
}

/// 탐지 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectResult {
    pub requires: Vec<Requirement>,
}

/// 작업 디렉토리를 보고 빌드 계획을 만듭니다.
pub async fn detect(working_dir: &Path) -> Result<DetectResult, BuildError> {
    let mut requires = vec![Requirement::build_time("node")];

    let node_modules = working_dir.join("node_modules");
    match tokio::fs::metadata(&node_modules).await {
        Ok(_) => debug!(path = %node_modules.display(), "node_modules present"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            requires.push(Requirement::build_time("node_modules"));
        }
        Err(e) => return Err(BuildError::io(&node_modules, e)),
    }

    Ok(DetectResult { requires })
}

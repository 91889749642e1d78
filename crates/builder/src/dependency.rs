//! 스캐너 도구 의존성 해석 및 설치
//!
//! [`DependencyManager`]는 매니페스트에서 도구 버전을 고르고, 캐시 레이어에
//! 설치하고, 도구 자체의 출처 레코드를 만드는 경계입니다.
//! 테스트에서는 가짜 구현으로 교체합니다.
//!
//! # 매니페스트 형식
//!
//! ```toml
//! [[metadata.dependencies]]
//! id = "cyclonedx-node-module"
//! name = "CycloneDX Node.js Module"
//! version = "3.0.7"
//! uri = "file:///deps/cyclonedx-bom"
//! sha256 = "..."
//! stacks = ["io.buildpacks.stacks.bionic"]
//! licenses = ["Apache-2.0"]
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use modbom_core::types::{Checksum, ChecksumAlgorithm, ProvenanceRecord};

use crate::error::BuildError;

/// 매니페스트에 기록된 도구 의존성
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub version: String,
    pub uri: String,
    /// 아티팩트의 SHA-256 (캐시 지문으로도 사용)
    pub sha256: String,
    #[serde(default)]
    pub stacks: Vec<String>,
    #[serde(default)]
    pub licenses: Vec<String>,
}

/// 도구 의존성 관리 trait
pub trait DependencyManager: Send + Sync {
    /// 매니페스트에서 id, 버전 제약, 스택에 맞는 의존성을 고릅니다.
    fn resolve(
        &self,
        manifest_path: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> impl Future<Output = Result<Dependency, BuildError>> + Send;

    /// 의존성을 레이어에 설치합니다.
    fn deliver(
        &self,
        dependency: &Dependency,
        cnb_path: &Path,
        layer_path: &Path,
        platform_path: &Path,
    ) -> impl Future<Output = Result<(), BuildError>> + Send;

    /// 설치한 의존성들의 출처 레코드를 만듭니다.
    fn generate_bom(&self, dependencies: &[Dependency]) -> Vec<ProvenanceRecord>;
}

#[derive(Deserialize)]
struct Manifest {
    #[serde(default)]
    metadata: ManifestMetadata,
}

#[derive(Default, Deserialize)]
struct ManifestMetadata {
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

/// `buildpack.toml` 기반 의존성 관리자
///
/// 로컬 파일 URI(`file://` 또는 경로)만 설치할 수 있습니다.
#[derive(Debug, Clone, Default)]
pub struct ManifestDependencyManager;

impl ManifestDependencyManager {
    pub fn new() -> Self {
        Self
    }
}

impl DependencyManager for ManifestDependencyManager {
    async fn resolve(
        &self,
        manifest_path: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> Result<Dependency, BuildError> {
        let content = tokio::fs::read_to_string(manifest_path)
            .await
            .map_err(|e| BuildError::io(manifest_path, e))?;
        let manifest: Manifest =
            toml::from_str(&content).map_err(|e| BuildError::Decode {
                path: manifest_path.display().to_string(),
                reason: e.to_string(),
            })?;

        select_dependency(manifest.metadata.dependencies, id, version, stack)
    }

    async fn deliver(
        &self,
        dependency: &Dependency,
        cnb_path: &Path,
        layer_path: &Path,
        platform_path: &Path,
    ) -> Result<(), BuildError> {
        let install_err = |reason: String| BuildError::DependencyInstall {
            name: dependency.id.clone(),
            reason,
        };

        let source = artifact_path(&dependency.uri, cnb_path).ok_or_else(|| {
            install_err(format!("unsupported uri '{}'", dependency.uri))
        })?;
        debug!(
            source = %source.display(),
            platform = %platform_path.display(),
            "delivering dependency"
        );

        let bytes = tokio::fs::read(&source)
            .await
            .map_err(|e| install_err(format!("{}: {e}", source.display())))?;

        let actual = hex::encode(Sha256::digest(&bytes));
        if !actual.eq_ignore_ascii_case(&dependency.sha256) {
            return Err(install_err(format!(
                "checksum mismatch: expected {}, got {actual}",
                dependency.sha256
            )));
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| install_err(format!("'{}' has no file name", source.display())))?;
        let bin_dir = layer_path.join("bin");
        tokio::fs::create_dir_all(&bin_dir)
            .await
            .map_err(|e| BuildError::io(&bin_dir, e))?;
        let target = bin_dir.join(file_name);
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| BuildError::io(&target, e))?;
        make_executable(&target).await?;

        info!(
            id = %dependency.id,
            version = %dependency.version,
            target = %target.display(),
            "dependency installed"
        );
        Ok(())
    }

    fn generate_bom(&self, dependencies: &[Dependency]) -> Vec<ProvenanceRecord> {
        dependencies.iter().map(tool_record).collect()
    }
}

/// 후보 중에서 id와 스택이 맞고 버전 제약을 만족하는 가장 높은 버전을 고릅니다.
///
/// `*`는 모든 버전/스택과 일치합니다. semver로 해석할 수 없는 버전은 건너뜁니다.
pub fn select_dependency(
    candidates: Vec<Dependency>,
    id: &str,
    version: &str,
    stack: &str,
) -> Result<Dependency, BuildError> {
    let requirement = if version == "*" {
        semver::VersionReq::STAR
    } else {
        semver::VersionReq::parse(version).map_err(|e| {
            BuildError::DependencyResolve(format!("invalid version constraint '{version}': {e}"))
        })?
    };

    candidates
        .into_iter()
        .filter(|d| d.id == id)
        .filter(|d| d.stacks.iter().any(|s| s == stack || s == "*"))
        .filter_map(|d| match semver::Version::parse(&d.version) {
            Ok(v) => Some((v, d)),
            Err(e) => {
                debug!(id = %d.id, version = %d.version, error = %e, "skipping unparsable version");
                None
            }
        })
        .filter(|(v, _)| requirement.matches(v))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, d)| d)
        .ok_or_else(|| {
            BuildError::DependencyResolve(format!(
                "no dependency '{id}' matching version '{version}' for stack '{stack}'"
            ))
        })
}

/// 도구 의존성의 출처 레코드
pub fn tool_record(dependency: &Dependency) -> ProvenanceRecord {
    let name = if dependency.name.is_empty() {
        dependency.id.clone()
    } else {
        dependency.name.clone()
    };
    ProvenanceRecord {
        name,
        version: dependency.version.clone(),
        purl: format!("pkg:generic/{}@{}", dependency.id, dependency.version),
        checksum: Some(Checksum::new(
            ChecksumAlgorithm::Sha256,
            dependency.sha256.to_ascii_lowercase(),
        )),
        licenses: dependency.licenses.clone(),
        uri: Some(dependency.uri.clone()),
    }
}

fn artifact_path(uri: &str, cnb_path: &Path) -> Option<PathBuf> {
    let raw = match uri.split_once("://") {
        Some(("file", rest)) => rest,
        Some(_) => return None,
        None => uri,
    };
    if raw.is_empty() {
        return None;
    }
    let path = Path::new(raw);
    Some(if path.is_absolute() {
        path.to_path_buf()
    } else {
        cnb_path.join(path)
    })
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), BuildError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| BuildError::io(path, e))
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<(), BuildError> {
    Ok(())
}

//! 캐시 레이어 저장소
//!
//! 레이어는 `<layers>/<name>/` 디렉토리와 그 옆의 `<layers>/<name>.toml`
//! 메타데이터 파일로 이루어집니다.
//!
//! ```toml
//! [types]
//! build = true
//! launch = false
//! cache = true
//!
//! [metadata]
//! cache-fingerprint = "b2a7..."
//! ```
//!
//! build/launch BOM은 `<layers>/build.toml`, `<layers>/launch.toml`에
//! `[[bom]]` 테이블 배열로 기록됩니다.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use modbom_core::types::{Checksum, ProvenanceRecord};

use crate::error::BuildError;

/// 레이어 메타데이터에서 캐시 지문을 담는 키
pub const FINGERPRINT_KEY: &str = "cache-fingerprint";

/// 레이어 루트 디렉토리
#[derive(Debug, Clone)]
pub struct Layers {
    root: PathBuf,
}

impl Layers {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 레이어를 가져오거나 새로 만듭니다.
    ///
    /// 메타데이터 파일이 없으면 빈 레이어를, 읽거나 해석할 수 없으면
    /// 경고를 남기고 빈 레이어를 돌려줍니다. 빈 레이어는 지문이 없으므로
    /// 항상 재빌드로 판정됩니다.
    pub async fn get(&self, name: &str) -> Result<CacheLayer, BuildError> {
        let path = self.root.join(name);
        let metadata_path = self.root.join(format!("{name}.toml"));

        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| BuildError::io(&path, e))?;

        let mut layer = CacheLayer {
            name: name.to_owned(),
            path,
            metadata_path,
            metadata: BTreeMap::new(),
            build: false,
            launch: false,
            cache: false,
        };

        match tokio::fs::read_to_string(&layer.metadata_path).await {
            Ok(content) => match toml::from_str::<LayerFile>(&content) {
                Ok(file) => {
                    layer.build = file.types.build;
                    layer.launch = file.types.launch;
                    layer.cache = file.types.cache;
                    layer.metadata = file.metadata;
                }
                Err(e) => warn!(
                    path = %layer.metadata_path.display(),
                    error = %e,
                    "layer metadata is unreadable, treating layer as empty"
                ),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(layer = name, "no layer metadata found");
            }
            Err(e) => warn!(
                path = %layer.metadata_path.display(),
                error = %e,
                "failed to read layer metadata, treating layer as empty"
            ),
        }

        Ok(layer)
    }

    /// build/launch BOM을 `build.toml`, `launch.toml`에 기록합니다.
    pub async fn write_boms(
        &self,
        build: &[ProvenanceRecord],
        launch: &[ProvenanceRecord],
    ) -> Result<(), BuildError> {
        for (file_name, records) in [("build.toml", build), ("launch.toml", launch)] {
            let path = self.root.join(file_name);
            let content = render_bom(records).map_err(|reason| BuildError::Decode {
                path: path.display().to_string(),
                reason,
            })?;
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| BuildError::io(&path, e))?;
        }
        Ok(())
    }
}

/// 캐시 레이어
///
/// 실행 시작 시 가져오거나 만들어지고, 캐시 적중이면 그대로,
/// 미스면 비운 뒤 다시 채워집니다. 실행 종료 시 메타데이터와 함께 기록됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayer {
    pub name: String,
    pub path: PathBuf,
    metadata_path: PathBuf,
    /// 실행 간에 유지되는 문자열 메타데이터
    pub metadata: BTreeMap<String, String>,
    pub build: bool,
    pub launch: bool,
    pub cache: bool,
}

impl CacheLayer {
    /// 저장된 캐시 지문
    pub fn fingerprint(&self) -> Option<&str> {
        self.metadata.get(FINGERPRINT_KEY).map(String::as_str)
    }

    pub fn set_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.metadata
            .insert(FINGERPRINT_KEY.to_owned(), fingerprint.into());
    }

    /// 도구 실행 파일이 놓이는 디렉토리
    pub fn bin_dir(&self) -> PathBuf {
        self.path.join("bin")
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// 레이어의 이전 내용을 모두 지웁니다.
    ///
    /// 디렉토리와 메타데이터 파일을 삭제한 뒤 빈 디렉토리를 다시 만듭니다.
    /// 이미 비어 있어도 성공합니다.
    pub async fn reset(&mut self) -> Result<(), BuildError> {
        let reset_err = |path: &Path, source: std::io::Error| BuildError::CacheReset {
            path: path.display().to_string(),
            source,
        };

        match tokio::fs::remove_dir_all(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                return Err(reset_err(&self.path, e));
            }
            _ => {}
        }
        match tokio::fs::remove_file(&self.metadata_path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                return Err(reset_err(&self.metadata_path, e));
            }
            _ => {}
        }
        tokio::fs::create_dir_all(&self.path)
            .await
            .map_err(|e| reset_err(&self.path, e))?;

        self.metadata.clear();
        self.build = false;
        self.launch = false;
        self.cache = false;
        debug!(layer = %self.name, "layer reset");
        Ok(())
    }

    /// `<name>.toml`에 플래그와 메타데이터를 기록합니다.
    pub async fn write_metadata(&self) -> Result<(), BuildError> {
        let file = LayerFile {
            types: LayerTypes {
                build: self.build,
                launch: self.launch,
                cache: self.cache,
            },
            metadata: self.metadata.clone(),
        };
        let content = toml::to_string(&file).map_err(|e| BuildError::Decode {
            path: self.metadata_path.display().to_string(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(&self.metadata_path, content)
            .await
            .map_err(|e| BuildError::io(&self.metadata_path, e))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerFile {
    #[serde(default)]
    types: LayerTypes,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerTypes {
    #[serde(default)]
    build: bool,
    #[serde(default)]
    launch: bool,
    #[serde(default)]
    cache: bool,
}

/// `[[bom]]` 테이블 한 개
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomEntry {
    pub name: String,
    pub metadata: BomMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomMetadata {
    pub version: String,
    #[serde(default)]
    pub purl: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<Checksum>,
    #[serde(default)]
    pub licenses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl From<&ProvenanceRecord> for BomEntry {
    fn from(record: &ProvenanceRecord) -> Self {
        Self {
            name: record.name.clone(),
            metadata: BomMetadata {
                version: record.version.clone(),
                purl: record.purl.clone(),
                checksum: record.checksum.clone(),
                licenses: record.licenses.clone(),
                uri: record.uri.clone(),
            },
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BomFile {
    #[serde(default)]
    pub bom: Vec<BomEntry>,
}

fn render_bom(records: &[ProvenanceRecord]) -> Result<String, String> {
    let file = BomFile {
        bom: records.iter().map(BomEntry::from).collect(),
    };
    toml::to_string(&file).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modbom_core::types::ChecksumAlgorithm;

    #[tokio::test]
    async fn get_missing_layer_is_empty_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layers = Layers::new(dir.path());
        let layer = layers.get("tool").await.unwrap();
        assert!(layer.path.is_dir());
        assert!(layer.fingerprint().is_none());
        assert!(!layer.cache);
    }

    #[tokio::test]
    async fn metadata_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let layers = Layers::new(dir.path());
        let mut layer = layers.get("tool").await.unwrap();
        layer.set_fingerprint("abc123");
        layer.cache = true;
        layer.build = true;
        layer.write_metadata().await.unwrap();

        let reloaded = layers.get("tool").await.unwrap();
        assert_eq!(reloaded.fingerprint(), Some("abc123"));
        assert!(reloaded.cache);
        assert!(reloaded.build);
        assert!(!reloaded.launch);
    }

    #[tokio::test]
    async fn corrupt_metadata_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tool.toml"), "[[[ not toml").unwrap();
        let layer = Layers::new(dir.path()).get("tool").await.unwrap();
        assert!(layer.fingerprint().is_none());
        assert!(layer.metadata.is_empty());
    }

    #[tokio::test]
    async fn reset_clears_contents_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let layers = Layers::new(dir.path());
        let mut layer = layers.get("tool").await.unwrap();
        std::fs::write(layer.path.join("stale"), "old").unwrap();
        layer.set_fingerprint("old");
        layer.cache = true;
        layer.write_metadata().await.unwrap();

        layer.reset().await.unwrap();

        assert!(layer.path.is_dir());
        assert!(!layer.path.join("stale").exists());
        assert!(!layer.metadata_path().exists());
        assert!(layer.metadata.is_empty());
        assert!(!layer.cache);
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut layer = Layers::new(dir.path()).get("tool").await.unwrap();
        layer.reset().await.unwrap();
        layer.reset().await.unwrap();
        assert!(layer.path.is_dir());
    }

    #[tokio::test]
    async fn write_boms_emits_bom_tables_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let layers = Layers::new(dir.path());

        let mut tool = ProvenanceRecord::new("scanner", "3.0.0");
        tool.checksum = Some(Checksum::new(ChecksumAlgorithm::Sha256, "ff00"));
        tool.uri = Some("file:///deps/scanner".to_owned());
        let mut app = ProvenanceRecord::new("leftpad", "0.0.1");
        app.purl = "pkg:npm/leftpad@0.0.1".to_owned();
        app.licenses = vec!["BSD-3-Clause".to_owned()];

        layers
            .write_boms(&[tool.clone(), app.clone()], std::slice::from_ref(&app))
            .await
            .unwrap();

        let build: BomFile =
            toml::from_str(&std::fs::read_to_string(dir.path().join("build.toml")).unwrap())
                .unwrap();
        let launch: BomFile =
            toml::from_str(&std::fs::read_to_string(dir.path().join("launch.toml")).unwrap())
                .unwrap();

        assert_eq!(build.bom.len(), 2);
        assert_eq!(build.bom[0].name, "scanner");
        assert_eq!(
            build.bom[0].metadata.checksum,
            Some(Checksum::new(ChecksumAlgorithm::Sha256, "ff00"))
        );
        assert_eq!(build.bom[1], BomEntry::from(&app));
        assert_eq!(launch.bom, vec![BomEntry::from(&app)]);
    }

    #[tokio::test]
    async fn write_boms_keeps_empty_purl() {
        let dir = tempfile::tempdir().unwrap();
        let layers = Layers::new(dir.path());
        let record = ProvenanceRecord::new("leftpad", "0.0.1");

        layers
            .write_boms(std::slice::from_ref(&record), std::slice::from_ref(&record))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("launch.toml")).unwrap();
        assert!(raw.contains("purl = \"\""), "launch.toml: {raw}");
        assert!(raw.contains("licenses = []"), "launch.toml: {raw}");
    }

    #[tokio::test]
    async fn write_boms_with_empty_sets() {
        let dir = tempfile::tempdir().unwrap();
        let layers = Layers::new(dir.path());
        layers.write_boms(&[], &[]).await.unwrap();
        let launch: BomFile =
            toml::from_str(&std::fs::read_to_string(dir.path().join("launch.toml")).unwrap())
                .unwrap();
        assert!(launch.bom.is_empty());
    }
}

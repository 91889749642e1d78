//! package-lock.json integrity 인덱스
//!
//! [`PackageLock`]은 npm lockfile을 타입이 있는 구조로 읽습니다.
//! v1 형식의 `dependencies`(중첩 포함)와 v2/v3 형식의 `packages`를 모두 인덱싱하며,
//! 같은 이름이 여러 번 나오면 먼저 본 항목이 남습니다.
//!
//! # integrity 형식
//!
//! `<algorithm>-<base64 hash>` (SRI). 공백으로 여러 해시가 이어질 수 있으며
//! 첫 번째만 사용합니다.
//!
//! ```json
//! {
//!   "name": "app",
//!   "lockfileVersion": 1,
//!   "dependencies": {
//!     "leftpad": { "version": "0.0.1", "integrity": "sha256-YWJjZGU=" }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use base64::prelude::{BASE64_STANDARD, Engine as _};
use serde::Deserialize;

use modbom_core::types::Checksum;

use crate::error::BuildError;
use crate::normalize::checksum_algorithm;

/// package-lock.json 구조
#[derive(Debug, Default, Deserialize)]
pub struct PackageLock {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "lockfileVersion")]
    pub lockfile_version: u32,
    #[serde(default)]
    pub dependencies: BTreeMap<String, LockDependency>,
    #[serde(default)]
    pub packages: BTreeMap<String, LockPackage>,
}

/// v1 `dependencies` 항목
#[derive(Debug, Default, Deserialize)]
pub struct LockDependency {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub integrity: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, LockDependency>,
}

/// v2/v3 `packages` 항목
#[derive(Debug, Default, Deserialize)]
pub struct LockPackage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub integrity: Option<String>,
}

impl PackageLock {
    /// lockfile을 읽습니다.
    ///
    /// 파일이 없거나, 너무 크거나, 형식이 맞지 않으면 모두
    /// [`BuildError::LockfileUnavailable`]입니다.
    pub fn load(path: &Path, max_file_size: usize) -> Result<Self, BuildError> {
        let unavailable = |reason: String| BuildError::LockfileUnavailable {
            path: path.display().to_string(),
            reason,
        };

        let metadata = std::fs::metadata(path).map_err(|e| unavailable(e.to_string()))?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if size > max_file_size {
            return Err(unavailable(format!(
                "file too large: {size} bytes (max: {max_file_size})"
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        Self::parse(&content).map_err(|e| unavailable(e.to_string()))
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// 이름 → integrity 인덱스를 만듭니다.
    pub fn index(&self) -> IntegrityIndex {
        let mut entries = HashMap::new();

        // v1: 최상위 먼저, 그 다음 중첩 의존성
        let mut queue: Vec<&BTreeMap<String, LockDependency>> = vec![&self.dependencies];
        while !queue.is_empty() {
            let mut next = Vec::new();
            for level in queue {
                for (name, dep) in level {
                    if let Some(integrity) = &dep.integrity {
                        entries
                            .entry(name.clone())
                            .or_insert_with(|| integrity.clone());
                    }
                    if !dep.dependencies.is_empty() {
                        next.push(&dep.dependencies);
                    }
                }
            }
            queue = next;
        }

        // v2/v3: 루트("")는 건너뜀
        for (key, pkg) in &self.packages {
            if key.is_empty() {
                continue;
            }
            let Some(integrity) = &pkg.integrity else {
                continue;
            };
            let name = pkg
                .name
                .clone()
                .unwrap_or_else(|| extract_package_name(key).to_owned());
            entries.entry(name).or_insert_with(|| integrity.clone());
        }

        IntegrityIndex { entries }
    }
}

/// 패키지 이름 → integrity 문자열
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityIndex {
    entries: HashMap<String, String>,
}

impl IntegrityIndex {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 패키지의 체크섬을 찾습니다.
    ///
    /// 패키지가 없거나 integrity에 구분자가 없으면 `Ok(None)`입니다.
    /// 알고리즘을 모르거나 해시가 base64가 아니면 에러입니다.
    pub fn find_checksum(&self, name: &str) -> Result<Option<Checksum>, BuildError> {
        match self.get(name) {
            Some(integrity) => find_checksum(integrity).map_err(|e| match e {
                BuildError::Decode { path, reason } => BuildError::Decode {
                    path,
                    reason: format!("package {name}: {reason}"),
                },
                other => other,
            }),
            None => Ok(None),
        }
    }
}

/// integrity 문자열을 체크섬으로 바꿉니다.
pub fn find_checksum(integrity: &str) -> Result<Option<Checksum>, BuildError> {
    let Some(token) = integrity.split_whitespace().next() else {
        return Ok(None);
    };
    let Some((algorithm, encoded)) = token.split_once('-') else {
        return Ok(None);
    };

    let algorithm = checksum_algorithm(algorithm)?;

    let raw = BASE64_STANDARD
        .decode(encoded)
        .map_err(|e| BuildError::Decode {
            path: "<integrity>".to_owned(),
            reason: format!("integrity '{token}' is not valid base64: {e}"),
        })?;
    Ok(Some(Checksum::new(algorithm, hex::encode(raw))))
}

/// "node_modules/@scope/name" 또는 "node_modules/name" 에서 패키지명 추출
fn extract_package_name(key: &str) -> &str {
    // 중첩된 경로는 마지막 "node_modules/" 이후가 패키지명
    match key.rfind("node_modules/") {
        Some(pos) => &key[pos + "node_modules/".len()..],
        None => key,
    }
}

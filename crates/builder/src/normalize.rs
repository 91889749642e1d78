//! CycloneDX 스캐너 출력 정규화
//!
//! 스캐너가 쓴 JSON 문서의 `components` 배열을 원본 순서 그대로
//! [`ProvenanceRecord`] 목록으로 바꿉니다. 문서가 깨졌으면 일부만 돌려주지 않고
//! 전체를 실패시킵니다.
//!
//! ```json
//! {
//!   "components": [
//!     {
//!       "name": "leftpad",
//!       "version": "0.0.1",
//!       "purl": "pkg:npm/leftpad@0.0.1",
//!       "hashes": [{ "alg": "SHA-1", "content": "86b1..." }],
//!       "licenses": [{ "license": { "id": "BSD-3-Clause" } }]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use metrics::counter;
use serde::Deserialize;
use tracing::debug;

use modbom_core::metrics::COMPONENTS_NORMALIZED_TOTAL;
use modbom_core::types::{Checksum, ChecksumAlgorithm, ProvenanceRecord};

use crate::error::BuildError;

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    components: Vec<Component>,
}

#[derive(Deserialize)]
struct Component {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    purl: String,
    #[serde(default)]
    hashes: Vec<HashEntry>,
    #[serde(default)]
    licenses: Vec<LicenseChoice>,
}

#[derive(Deserialize)]
struct HashEntry {
    alg: String,
    content: String,
}

#[derive(Deserialize)]
struct LicenseChoice {
    #[serde(default)]
    license: Option<License>,
}

#[derive(Deserialize)]
struct License {
    #[serde(default)]
    id: Option<String>,
}

/// 알고리즘 이름을 열거형으로 바꾸고, 모르는 이름은 빌드 에러로 돌려줍니다.
pub(crate) fn checksum_algorithm(name: &str) -> Result<ChecksumAlgorithm, BuildError> {
    ChecksumAlgorithm::parse(name).map_err(|_| BuildError::UnsupportedAlgorithm(name.to_owned()))
}

/// 스캐너 출력 파일을 읽어 정규화합니다.
pub async fn normalize(
    path: &Path,
    max_file_size: usize,
) -> Result<Vec<ProvenanceRecord>, BuildError> {
    let decode_err = |reason: String| BuildError::Decode {
        path: path.display().to_string(),
        reason,
    };

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| decode_err(e.to_string()))?;
    let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    if size > max_file_size {
        return Err(decode_err(format!(
            "file too large: {size} bytes (max: {max_file_size})"
        )));
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| decode_err(e.to_string()))?;

    parse_document(&content).map_err(|e| match e {
        BuildError::Decode { reason, .. } => decode_err(reason),
        other => other,
    })
}

/// 메모리의 CycloneDX JSON 문서를 정규화합니다.
pub fn parse_document(content: &str) -> Result<Vec<ProvenanceRecord>, BuildError> {
    let document: Document = serde_json::from_str(content).map_err(|e| BuildError::Decode {
        path: "<memory>".to_owned(),
        reason: e.to_string(),
    })?;

    let records = document
        .components
        .into_iter()
        .enumerate()
        .map(|(index, component)| normalize_component(index, component))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(components = records.len(), "scanner output normalized");
    counter!(COMPONENTS_NORMALIZED_TOTAL).increment(records.len() as u64);
    Ok(records)
}

fn normalize_component(index: usize, component: Component) -> Result<ProvenanceRecord, BuildError> {
    if component.name.is_empty() {
        return Err(BuildError::Decode {
            path: "<memory>".to_owned(),
            reason: format!("component at index {index} has no name"),
        });
    }

    // 해시가 여러 개면 첫 번째만 사용
    let checksum = match component.hashes.into_iter().next() {
        Some(hash) => Some(Checksum::new(checksum_algorithm(&hash.alg)?, hash.content)),
        None => None,
    };

    let licenses = component
        .licenses
        .into_iter()
        .filter_map(|choice| choice.license.and_then(|l| l.id))
        .filter(|id| !id.is_empty())
        .collect();

    Ok(ProvenanceRecord {
        name: component.name,
        version: component.version,
        purl: component.purl,
        checksum,
        licenses,
        uri: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
  "bomFormat": "CycloneDX",
  "specVersion": "1.2",
  "components": [
    {
      "type": "library",
      "name": "leftpad",
      "version": "0.0.1",
      "description": "left pad numbers",
      "hashes": [
        { "alg": "SHA-1", "content": "86b1a4de4face180ac545a83f1503523d8fed115" }
      ],
      "licenses": [ { "license": { "id": "BSD-3-Clause" } } ],
      "purl": "pkg:npm/leftpad@0.0.1"
    },
    {
      "type": "library",
      "name": "rightpad",
      "version": "1.0.0",
      "licenses": [ { "license": { "id": "Apache" } } ],
      "purl": "pkg:npm/rightpad@1.0.0"
    }
  ]
}"#;

    #[test]
    fn sample_document_normalizes() {
        let records = parse_document(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);

        let leftpad = &records[0];
        assert_eq!(leftpad.name, "leftpad");
        assert_eq!(leftpad.version, "0.0.1");
        assert_eq!(leftpad.purl, "pkg:npm/leftpad@0.0.1");
        assert_eq!(
            leftpad.checksum,
            Some(Checksum::new(
                ChecksumAlgorithm::Sha1,
                "86b1a4de4face180ac545a83f1503523d8fed115"
            ))
        );
        assert_eq!(leftpad.licenses, vec!["BSD-3-Clause"]);

        let rightpad = &records[1];
        assert_eq!(rightpad.name, "rightpad");
        assert_eq!(rightpad.checksum, None);
        assert_eq!(rightpad.licenses, vec!["Apache"]);
    }

    #[test]
    fn first_hash_wins() {
        let records = parse_document(
            r#"{"components":[{"name":"a","hashes":[
                {"alg":"SHA-512","content":"first"},
                {"alg":"SHA-1","content":"second"}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(
            records[0].checksum,
            Some(Checksum::new(ChecksumAlgorithm::Sha512, "first"))
        );
    }

    #[test]
    fn unknown_algorithm_fails_whole_document() {
        let err = parse_document(
            r#"{"components":[
                {"name":"ok","hashes":[{"alg":"SHA-1","content":"x"}]},
                {"name":"bad","hashes":[{"alg":"randomAlgorithm","content":"y"}]}
            ]}"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to get supported BOM checksum algorithm: randomAlgorithm is not valid"
        );
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let err = parse_document("{\"components\": [").unwrap_err();
        assert!(matches!(err, BuildError::Decode { .. }));
    }

    #[test]
    fn missing_name_is_decode_error() {
        let err = parse_document(r#"{"components":[{"version":"1.0.0"}]}"#).unwrap_err();
        assert!(err.to_string().contains("index 0 has no name"));
    }

    #[test]
    fn missing_components_is_empty() {
        assert!(parse_document("{}").unwrap().is_empty());
    }

    #[test]
    fn license_order_preserved_and_nameless_skipped() {
        let records = parse_document(
            r#"{"components":[{"name":"a","licenses":[
                {"license":{"id":"MIT"}},
                {"license":{"name":"Custom"}},
                {"expression":"MIT OR Apache-2.0"},
                {"license":{"id":"Apache-2.0"}}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(records[0].licenses, vec!["MIT", "Apache-2.0"]);
    }

    #[tokio::test]
    async fn normalize_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let records = normalize(&path, 1024 * 1024).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn normalize_reports_file_path_on_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.json");
        std::fs::write(&path, "not json").unwrap();
        let err = normalize(&path, 1024).await.unwrap_err();
        assert!(err.to_string().contains("bom.json"));
    }

    #[tokio::test]
    async fn normalize_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let err = normalize(&path, 16).await.unwrap_err();
        assert!(err.to_string().contains("file too large"));
    }
}

//! 도메인 타입 -- BOM 파이프라인 전역에서 사용되는 공통 타입
//!
//! 스캐너 출력, lockfile, 도구 매니페스트에서 얻은 정보는 모두
//! [`ProvenanceRecord`]로 정규화되어 build/launch BOM에 담깁니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BomError;

/// 체크섬 알고리즘
///
/// 닫힌 열거형입니다. 여기에 없는 알고리즘 이름은 조용히 버려지지 않고
/// [`BomError::UnsupportedAlgorithm`]으로 보고됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChecksumAlgorithm {
    #[serde(rename = "SHA-1")]
    Sha1,
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
    #[serde(rename = "SHA3-256")]
    Sha3_256,
    #[serde(rename = "SHA3-384")]
    Sha3_384,
    #[serde(rename = "SHA3-512")]
    Sha3_512,
    #[serde(rename = "BLAKE2b-256")]
    Blake2b256,
    #[serde(rename = "BLAKE2b-384")]
    Blake2b384,
    #[serde(rename = "BLAKE2b-512")]
    Blake2b512,
    #[serde(rename = "BLAKE3")]
    Blake3,
    #[serde(rename = "MD5")]
    Md5,
}

impl ChecksumAlgorithm {
    /// 지원하는 모든 알고리즘
    pub const ALL: [ChecksumAlgorithm; 12] = [
        Self::Sha1,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha3_256,
        Self::Sha3_384,
        Self::Sha3_512,
        Self::Blake2b256,
        Self::Blake2b384,
        Self::Blake2b512,
        Self::Blake3,
        Self::Md5,
    ];

    /// 표준 표기 (`SHA-256` 등)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_384 => "SHA3-384",
            Self::Sha3_512 => "SHA3-512",
            Self::Blake2b256 => "BLAKE2b-256",
            Self::Blake2b384 => "BLAKE2b-384",
            Self::Blake2b512 => "BLAKE2b-512",
            Self::Blake3 => "BLAKE3",
            Self::Md5 => "MD5",
        }
    }

    /// 알고리즘 이름을 열거형으로 변환합니다.
    ///
    /// 대소문자를 구분하지 않으며, 하이픈을 뺀 표기도 허용합니다.
    /// (`sha256`, `SHA256`, `sha-256`, `SHA-256` 모두 `Sha256`)
    pub fn parse(name: &str) -> Result<Self, BomError> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| {
                let canonical = alg.as_str();
                canonical.eq_ignore_ascii_case(name)
                    || canonical.replace('-', "").eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| BomError::UnsupportedAlgorithm(name.to_owned()))
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 알고리즘과 hex 인코딩된 해시 값
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    /// 해시 알고리즘
    pub algorithm: ChecksumAlgorithm,
    /// 16진수 문자열
    pub hash: String,
}

impl Checksum {
    /// 새 체크섬을 생성합니다.
    pub fn new(algorithm: ChecksumAlgorithm, hash: impl Into<String>) -> Self {
        Self {
            algorithm,
            hash: hash.into(),
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hash)
    }
}

/// 발견된 소프트웨어 컴포넌트 하나에 대한 출처 정보
///
/// `name`은 항상 비어있지 않습니다. `checksum`은 스캐너가 해시를 주지 않았고
/// lockfile에서도 찾지 못했을 때 `None`입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// 컴포넌트 이름
    pub name: String,
    /// 버전 문자열
    pub version: String,
    /// Package URL
    pub purl: String,
    /// 체크섬 (reconcile 전에는 없을 수 있음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<Checksum>,
    /// 라이선스 식별자 (원본 순서 유지)
    #[serde(default)]
    pub licenses: Vec<String>,
    /// 다운로드 URI (도구 레코드에만 설정)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl ProvenanceRecord {
    /// 이름과 버전만 가진 레코드를 생성합니다.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            purl: String::new(),
            checksum: None,
            licenses: Vec::new(),
            uri: None,
        }
    }
}

impl fmt::Display for ProvenanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)?;
        if let Some(checksum) = &self.checksum {
            write!(f, " ({checksum})")?;
        }
        Ok(())
    }
}

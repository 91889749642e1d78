//! modbom 공통 크레이트
//!
//! 빌드 단계에서 SBOM을 생성하는 모든 크레이트가 공유하는 기반 타입을 정의합니다.
//!
//! - [`error`]: 최상위 에러 [`ModbomError`]와 도메인별 에러
//! - [`config`]: `modbom.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`types`]: [`ProvenanceRecord`], [`ChecksumAlgorithm`] 등 도메인 타입
//! - [`metrics`]: 메트릭 이름 상수와 설명 등록

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{BomError, ConfigError, ModbomError};

// 설정
pub use config::ModbomConfig;

// 도메인 타입
pub use types::{Checksum, ChecksumAlgorithm, ProvenanceRecord};

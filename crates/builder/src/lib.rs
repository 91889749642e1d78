//! modbom 빌더 -- 캐시 레이어 판정과 모듈 BOM 생성
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`BuildError`)
//! - [`config`]: Builder configuration (`BuilderConfig`, builder)
//! - [`layer`]: Cache layer store (`Layers`, `CacheLayer`, BOM tables)
//! - [`cache`]: Reuse/rebuild decision (`decide`, `CacheDecision`)
//! - [`dependency`]: Tool resolution and delivery (`DependencyManager`, `ManifestDependencyManager`)
//! - [`scan`]: Scanner invocation (`Executable`, `ProcessExecutable`, `ComponentScanner`, `ScanOutput`)
//! - [`normalize`]: CycloneDX output to provenance records
//! - [`lockfile`]: package-lock.json integrity index (`PackageLock`, `IntegrityIndex`)
//! - [`reconcile`]: Checksum back-fill (`ChecksumReconciler`)
//! - [`builder`]: Main orchestrator (`BomBuilder`, `BuildStage`, `BuildResult`)
//! - [`detect`]: Build plan detection
//!
//! # Architecture
//!
//! ```text
//! buildpack.toml --> DependencyManager --> fingerprint --> decide(stored, current)
//!                                                               |
//!                                              Reuse <----------+----------> Rebuild
//!                                                |                             |
//!                                                |                  reset + deliver tool
//!                                                +--------------+--------------+
//!                                                               |
//!                              ComponentScanner --> bom.json --> normalize
//!                                                                   |
//!                                     package-lock.json --> ChecksumReconciler
//!                                                                   |
//!                                         build BOM = tool + module, launch BOM = module
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod dependency;
pub mod detect;
pub mod error;
pub mod layer;
pub mod lockfile;
pub mod normalize;
pub mod reconcile;
pub mod scan;

// --- Public API Re-exports ---

// Orchestrator
pub use builder::{BomBuilder, BuildContext, BuildResult, BuildStage};

// Configuration
pub use config::{BuilderConfig, BuilderConfigBuilder};

// Error
pub use error::BuildError;

// Cache
pub use cache::{CacheDecision, decide};
pub use layer::{CacheLayer, FINGERPRINT_KEY, Layers};

// Tool dependency
pub use dependency::{Dependency, DependencyManager, ManifestDependencyManager};

// Scanner
pub use scan::{ComponentScanner, Executable, Execution, ExecutionOutput, ProcessExecutable, ScanOutput};

// BOM
pub use lockfile::{IntegrityIndex, PackageLock};
pub use normalize::{normalize, parse_document};
pub use reconcile::ChecksumReconciler;

// Detect
pub use detect::{DetectResult, Requirement, detect};

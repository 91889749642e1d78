//! BOM 빌드 오케스트레이터 -- 전체 빌드 흐름 관리
//!
//! [`BomBuilder`]는 캐시 판정, 도구 설치, 스캔, 정규화, 보정, 분할을
//! 순서대로 수행하는 상태 기계입니다. 단계 사이에 병렬성은 없습니다.
//!
//! # 상태 전이
//!
//! ```text
//! ResolvingCache --> Reusing ---+
//!        |                      |
//!        +-------> Rebuilding --+--> Scanning --> Normalizing --> Reconciling
//!                                                                     |
//!                                  Done <-- Partitioning <-----------+
//!
//! (어느 단계에서든) --> Aborted
//! ```
//!
//! 캐시 적중은 도구 설치만 건너뜁니다. BOM은 매 실행마다 다시 만듭니다.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, error, info};

use modbom_core::metrics::{
    BUILD_ABORTS_TOTAL, BUILD_DURATION_SECONDS, BUILDS_TOTAL, CACHE_RESETS_TOTAL, LABEL_RESULT,
    LABEL_STAGE,
};
use modbom_core::types::ProvenanceRecord;

use crate::cache::{CacheDecision, decide};
use crate::config::BuilderConfig;
use crate::dependency::{Dependency, DependencyManager};
use crate::error::BuildError;
use crate::layer::{CacheLayer, Layers};
use crate::normalize::normalize;
use crate::reconcile::ChecksumReconciler;
use crate::scan::{ComponentScanner, Executable};

/// 파이프라인 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Idle,
    ResolvingCache,
    Reusing,
    Rebuilding,
    Scanning,
    Normalizing,
    Reconciling,
    Partitioning,
    Done,
    Aborted,
}

impl BuildStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ResolvingCache => "resolving_cache",
            Self::Reusing => "reusing",
            Self::Rebuilding => "rebuilding",
            Self::Scanning => "scanning",
            Self::Normalizing => "normalizing",
            Self::Reconciling => "reconciling",
            Self::Partitioning => "partitioning",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 한 번의 빌드 호출에 필요한 경로들
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// 스캔 대상 의존성 트리의 루트
    pub working_dir: PathBuf,
    pub layers_dir: PathBuf,
    /// 매니페스트와 도구 아티팩트가 있는 디렉토리
    pub cnb_dir: PathBuf,
    pub platform_dir: PathBuf,
    pub stack: String,
}

/// 빌드 결과
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// 도구 레코드 + 애플리케이션 레코드
    pub build_bom: Vec<ProvenanceRecord>,
    /// 애플리케이션 레코드만
    pub launch_bom: Vec<ProvenanceRecord>,
    pub layer: CacheLayer,
    pub decision: CacheDecision,
    pub dependency: Dependency,
}

impl BuildResult {
    /// 레이어 메타데이터와 build/launch BOM을 layers 디렉토리에 기록합니다.
    pub async fn persist(&self, layers_dir: &Path) -> Result<(), BuildError> {
        self.layer.write_metadata().await?;
        Layers::new(layers_dir)
            .write_boms(&self.build_bom, &self.launch_bom)
            .await?;
        debug!(
            layers_dir = %layers_dir.display(),
            build = self.build_bom.len(),
            launch = self.launch_bom.len(),
            "build result persisted"
        );
        Ok(())
    }
}

/// BOM 빌드 오케스트레이터
pub struct BomBuilder<D, E> {
    config: BuilderConfig,
    dependencies: D,
    scanner: ComponentScanner<E>,
    stage: BuildStage,
}

impl<D: DependencyManager, E: Executable> BomBuilder<D, E> {
    /// 설정을 검증하고 빌더를 생성합니다.
    pub fn new(config: BuilderConfig, dependencies: D, executable: E) -> Result<Self, BuildError> {
        config.validate()?;
        let scanner = ComponentScanner::new(executable, config.output_file.clone());
        Ok(Self {
            config,
            dependencies,
            scanner,
            stage: BuildStage::Idle,
        })
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn dependencies(&self) -> &D {
        &self.dependencies
    }

    fn transition(&mut self, next: BuildStage) {
        debug!(from = %self.stage, stage = %next, "stage transition");
        self.stage = next;
    }

    /// 전체 파이프라인을 실행합니다.
    ///
    /// 실패하면 상태는 `Aborted`가 되고, 실패한 단계가 에러 로그에 남습니다.
    pub async fn run(&mut self, ctx: &BuildContext) -> Result<BuildResult, BuildError> {
        let started = Instant::now();
        let result = self.run_stages(ctx).await;
        histogram!(BUILD_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        match &result {
            Ok(built) => {
                counter!(BUILDS_TOTAL, LABEL_RESULT => "success").increment(1);
                info!(
                    decision = %built.decision,
                    build_bom = built.build_bom.len(),
                    launch_bom = built.launch_bom.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "build completed"
                );
            }
            Err(e) => {
                let failed = self.stage;
                self.transition(BuildStage::Aborted);
                counter!(BUILDS_TOTAL, LABEL_RESULT => "failure").increment(1);
                counter!(BUILD_ABORTS_TOTAL, LABEL_STAGE => failed.as_str()).increment(1);
                error!(stage = %failed, error = %e, "build aborted");
            }
        }
        result
    }

    async fn run_stages(&mut self, ctx: &BuildContext) -> Result<BuildResult, BuildError> {
        // 스위치는 실행 시작 시 한 번만 읽음
        let disable_sbom = self.config.disable_sbom;

        self.transition(BuildStage::ResolvingCache);
        let manifest = ctx.cnb_dir.join(&self.config.manifest_name);
        let dependency = self
            .dependencies
            .resolve(
                &manifest,
                &self.config.tool_id,
                &self.config.tool_version,
                &ctx.stack,
            )
            .await?;
        info!(
            id = %dependency.id,
            version = %dependency.version,
            "Selected tool version"
        );

        let mut layer = Layers::new(&ctx.layers_dir)
            .get(&self.config.layer_name)
            .await?;
        let decision = decide(layer.fingerprint(), &dependency.sha256);

        match decision {
            CacheDecision::Reuse => {
                self.transition(BuildStage::Reusing);
                debug!(path = %layer.path.display(), "keeping installed tool");
            }
            CacheDecision::Rebuild => {
                self.transition(BuildStage::Rebuilding);
                layer.reset().await?;
                counter!(CACHE_RESETS_TOTAL).increment(1);

                info!(id = %dependency.id, version = %dependency.version, "Installing tool");
                let started = Instant::now();
                self.dependencies
                    .deliver(&dependency, &ctx.cnb_dir, &layer.path, &ctx.platform_dir)
                    .await?;
                info!(elapsed_ms = started.elapsed().as_millis() as u64, "Completed install");

                layer.set_fingerprint(dependency.sha256.clone());
            }
        }

        let (tool_bom, module_bom) = if disable_sbom {
            info!("Skipping module BOM generation");
            (Vec::new(), Vec::new())
        } else {
            let tool_bom = self
                .dependencies
                .generate_bom(std::slice::from_ref(&dependency));
            let module_bom = self.generate_module_bom(&ctx.working_dir).await?;
            (tool_bom, module_bom)
        };

        self.transition(BuildStage::Partitioning);
        let mut build_bom = tool_bom;
        build_bom.extend(module_bom.iter().cloned());
        let launch_bom = module_bom;

        layer.cache = true;
        self.transition(BuildStage::Done);

        Ok(BuildResult {
            build_bom,
            launch_bom,
            layer,
            decision,
            dependency,
        })
    }

    /// 스캔 → 정규화 → 보정
    ///
    /// 스캐너 출력 파일은 이 함수를 떠날 때 어느 경로에서든 지워집니다.
    async fn generate_module_bom(
        &mut self,
        working_dir: &Path,
    ) -> Result<Vec<ProvenanceRecord>, BuildError> {
        self.transition(BuildStage::Scanning);
        let started = Instant::now();
        let output = self.scanner.invoke(working_dir).await?;

        self.transition(BuildStage::Normalizing);
        let records = normalize(output.path(), self.config.max_file_size).await?;

        self.transition(BuildStage::Reconciling);
        let reconciler = ChecksumReconciler::new(
            working_dir.join(&self.config.lockfile_name),
            self.config.max_file_size,
        );
        let records = reconciler.reconcile(records)?;
        output.close()?;

        info!(
            components = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Completed module BOM generation"
        );
        Ok(records)
    }
}

//! `modbom build` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use modbom_builder::{
    BomBuilder, BuildContext, BuildResult, BuilderConfig, ManifestDependencyManager,
    ProcessExecutable,
};
use modbom_core::config::ModbomConfig;
use modbom_core::types::ProvenanceRecord;

use crate::cli::BuildArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `build` command.
pub async fn execute(
    args: BuildArgs,
    config: &ModbomConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let builder_config = BuilderConfig::from_core(&config.bom);
    let bin_dir = args
        .layers_dir
        .join(&builder_config.layer_name)
        .join("bin");
    let executable =
        ProcessExecutable::new(builder_config.scanner_command.clone()).search_dir(bin_dir.clone());

    let mut builder = BomBuilder::new(builder_config, ManifestDependencyManager::new(), executable)?;

    let ctx = BuildContext {
        working_dir: args.working_dir,
        layers_dir: args.layers_dir,
        cnb_dir: args.cnb_dir,
        platform_dir: args.platform_dir,
        stack: args.stack,
    };
    info!(
        working_dir = %ctx.working_dir.display(),
        layers_dir = %ctx.layers_dir.display(),
        stack = %ctx.stack,
        "starting build"
    );

    let result = builder.run(&ctx).await?;
    result.persist(&ctx.layers_dir).await?;

    let report = BuildReport::new(&result, bin_dir.display().to_string());
    writer.render(&report)
}

#[derive(Serialize)]
pub struct BuildReport {
    pub decision: String,
    pub tool: String,
    pub tool_version: String,
    pub layer: String,
    /// Directory to put on PATH to reach the installed tool.
    pub bin_dir: String,
    pub build_bom: Vec<ProvenanceRecord>,
    pub launch_bom: Vec<ProvenanceRecord>,
}

impl BuildReport {
    pub fn new(result: &BuildResult, bin_dir: String) -> Self {
        Self {
            decision: result.decision.to_string(),
            tool: result.dependency.id.clone(),
            tool_version: result.dependency.version.clone(),
            layer: result.layer.path.display().to_string(),
            bin_dir,
            build_bom: result.build_bom.clone(),
            launch_bom: result.launch_bom.clone(),
        }
    }
}

impl Render for BuildReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Layer: {} ({})",
            self.layer.bold(),
            self.decision.cyan()
        )?;
        writeln!(w, "Tool: {} {}", self.tool, self.tool_version)?;
        writeln!(w, "Bin dir: {}", self.bin_dir)?;
        writeln!(w)?;

        if self.launch_bom.is_empty() && self.build_bom.is_empty() {
            writeln!(w, "{}", "Module BOM generation skipped.".yellow())?;
            return Ok(());
        }

        writeln!(
            w,
            "Build BOM: {} entries, launch BOM: {} entries",
            self.build_bom.len(),
            self.launch_bom.len()
        )?;
        writeln!(w, "{:<30} {:<12} Checksum", "Name", "Version")?;
        writeln!(w, "{}", "-".repeat(80))?;
        for record in &self.build_bom {
            let checksum = record
                .checksum
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_owned());
            writeln!(w, "{:<30} {:<12} {}", record.name, record.version, checksum)?;
        }
        Ok(())
    }
}

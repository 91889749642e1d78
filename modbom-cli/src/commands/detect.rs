//! `modbom detect` command handler

use std::io::Write;

use serde::Serialize;

use modbom_builder::{DetectResult, detect};

use crate::cli::DetectArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `detect` command.
pub async fn execute(args: DetectArgs, writer: &OutputWriter) -> Result<(), CliError> {
    let result = detect(&args.working_dir).await?;
    let report = DetectReport {
        working_dir: args.working_dir.display().to_string(),
        plan: result,
    };
    writer.render(&report)
}

#[derive(Serialize)]
pub struct DetectReport {
    pub working_dir: String,
    #[serde(flatten)]
    pub plan: DetectResult,
}

impl Render for DetectReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Detect: {}", self.working_dir.bold())?;
        for requirement in &self.plan.requires {
            let phase = if requirement.build { "build" } else { "launch" };
            writeln!(w, "  requires {:<14} ({})", requirement.name, phase.dimmed())?;
        }
        Ok(())
    }
}

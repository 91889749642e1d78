//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// modbom -- cache-aware module BOM build step.
///
/// Use `modbom <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "modbom", version, about, long_about = None)]
pub struct Cli {
    /// Path to a modbom.toml configuration file (default: built-in defaults + env).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report the build plan requirements for an application.
    Detect(DetectArgs),

    /// Install the scanner tool and generate build/launch BOMs.
    Build(BuildArgs),
}

// ---- detect ----

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Application root (default: current directory).
    #[arg(long, default_value = ".")]
    pub working_dir: PathBuf,
}

// ---- build ----

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Application root containing the installed dependency tree.
    #[arg(long, default_value = ".")]
    pub working_dir: PathBuf,

    /// Directory holding cache layers and the build/launch BOM files.
    #[arg(long)]
    pub layers_dir: PathBuf,

    /// Directory holding buildpack.toml and tool artifacts.
    #[arg(long)]
    pub cnb_dir: PathBuf,

    /// Platform directory handed to the dependency manager.
    #[arg(long, default_value = "/platform")]
    pub platform_dir: PathBuf,

    /// Stack identifier used to select the tool artifact.
    #[arg(long, env = "CNB_STACK_ID", default_value = "*")]
    pub stack: String,
}

//! modbom CLI entry point
//!
//! Parses arguments, loads configuration, initializes logging and dispatches
//! to the subcommand handler. Errors are printed to stderr and mapped to exit codes.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = commands::load_config(cli.config.as_deref()).await?;

    logging::init_tracing(&config.general, cli.log_level.as_deref())
        .map_err(|e| CliError::Config(e.to_string()))?;
    modbom_core::metrics::describe_all();

    tracing::debug!(config = ?cli.config, "modbom starting");

    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Detect(args) => commands::detect::execute(args, &writer).await,
        Commands::Build(args) => commands::build::execute(args, &config, &writer).await,
    }
}

//! Command handlers -- one module per subcommand

pub mod build;
pub mod detect;

use std::path::Path;

use modbom_core::config::ModbomConfig;

use crate::error::CliError;

/// Load the effective configuration: file (if given) + env overrides + defaults.
pub async fn load_config(path: Option<&Path>) -> Result<ModbomConfig, CliError> {
    let config = match path {
        Some(path) => ModbomConfig::load(path).await?,
        None => ModbomConfig::from_env()?,
    };
    Ok(config)
}

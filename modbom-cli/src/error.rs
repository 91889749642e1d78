//! CLI-specific error types and exit code mapping

use modbom_builder::BuildError;
use modbom_core::error::{BomError, ModbomError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The component scanner could not be run or exited unsuccessfully.
    #[error("scan error: {0}")]
    Scan(String),

    /// Scanner output or a checksum violated the expected data contract.
    #[error("data error: {0}")]
    Data(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                   |
    /// |------|-------------------------------------------|
    /// | 0    | Success                                   |
    /// | 1    | General / command error                   |
    /// | 2    | Configuration error                       |
    /// | 3    | Scanner execution failed                  |
    /// | 4    | Decode error or unsupported algorithm     |
    /// | 10   | IO error                                  |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Scan(_) => 3,
            Self::Data(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<ModbomError> for CliError {
    fn from(e: ModbomError) -> Self {
        match e {
            ModbomError::Config(c) => Self::Config(c.to_string()),
            ModbomError::Bom(BomError::ScanFailed(msg)) => Self::Scan(msg),
            ModbomError::Bom(BomError::Decode(msg)) => Self::Data(msg),
            ModbomError::Bom(b @ BomError::UnsupportedAlgorithm(_)) => Self::Data(b.to_string()),
            ModbomError::Bom(b @ (BomError::CacheReset(_) | BomError::Dependency(_))) => {
                Self::Command(b.to_string())
            }
            ModbomError::Io(io) => Self::Io(io),
        }
    }
}

impl From<BuildError> for CliError {
    fn from(e: BuildError) -> Self {
        ModbomError::from(e).into()
    }
}

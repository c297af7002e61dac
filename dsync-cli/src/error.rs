//! CLI error types and result alias.

use dsync_migrate::{MigrationError, ProcessError};
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Exit status used when a run was interrupted.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(dsync::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(dsync::config), help("run `dsync init` to generate an example config"))]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    #[diagnostic(code(dsync::validation))]
    Validation(String),

    /// Database migration error
    #[error("Migration error: {0}")]
    #[diagnostic(code(dsync::migration))]
    Migration(MigrationError),

    /// File sync error
    #[error("File sync error: {0}")]
    #[diagnostic(code(dsync::sync))]
    Sync(String),

    /// The run was interrupted
    #[error("Interrupted")]
    #[diagnostic(code(dsync::interrupted))]
    Interrupted,
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Interrupted => INTERRUPTED_EXIT_CODE,
            _ => 1,
        }
    }
}

impl From<MigrationError> for CliError {
    fn from(err: MigrationError) -> Self {
        match err {
            err if err.is_cancelled() => CliError::Interrupted,
            MigrationError::Configuration(msg) => CliError::Validation(msg),
            err => CliError::Migration(err),
        }
    }
}

impl From<ProcessError> for CliError {
    fn from(err: ProcessError) -> Self {
        if err.is_cancelled() {
            CliError::Interrupted
        } else {
            CliError::Sync(err.to_string())
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Config(format!("Failed to serialize TOML: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Config(format!("Failed to parse JSON: {}", err))
    }
}

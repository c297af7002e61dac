//! Error types for the migration engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::migrator::MigrationStep;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Result type alias for external process invocations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Errors raised while running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The command could not be started (not found, not executable).
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the command's pipes failed.
    #[error("I/O error while running '{program}': {source}")]
    Io {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The command exited with a non-zero status.
    #[error("'{program}' exited with {}: {stderr}", exit_label(.code))]
    Failed {
        /// Program that was invoked.
        program: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The command was terminated because the run was cancelled.
    #[error("'{program}' was cancelled")]
    Cancelled {
        /// Program that was invoked.
        program: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

impl ProcessError {
    /// Create a failure for a command that exited unsuccessfully.
    pub fn failed(program: impl Into<String>, code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::Failed {
            program: program.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(program: impl Into<String>) -> Self {
        Self::Cancelled {
            program: program.into(),
        }
    }

    /// Check if the command was cancelled rather than failing on its own.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The program this error belongs to.
    pub fn program(&self) -> &str {
        match self {
            Self::Spawn { program, .. }
            | Self::Io { program, .. }
            | Self::Failed { program, .. }
            | Self::Cancelled { program } => program,
        }
    }
}

/// Errors that can occur during a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The source endpoint could not produce a snapshot.
    #[error("Dump of {endpoint} failed: {source}")]
    Dump {
        /// Endpoint being dumped.
        endpoint: String,
        /// Executor failure.
        #[source]
        source: ProcessError,
    },

    /// The destination database or principal could not be ensured.
    #[error("Preparing {endpoint} failed: {source}")]
    TargetPreparation {
        /// Endpoint being prepared.
        endpoint: String,
        /// Executor failure.
        #[source]
        source: ProcessError,
    },

    /// The destination could not be backed up before being overwritten.
    #[error("Backup of {endpoint} failed: {source}")]
    Backup {
        /// Endpoint being backed up.
        endpoint: String,
        /// Executor failure.
        #[source]
        source: ProcessError,
    },

    /// The destination rejected the transformed snapshot.
    #[error("Load into {endpoint} failed: {source}")]
    Load {
        /// Endpoint being written.
        endpoint: String,
        /// Executor failure.
        #[source]
        source: ProcessError,
    },

    /// The transformed snapshot could not be written to a local file.
    #[error("Failed to save dump to {}: {source}", .path.display())]
    Persist {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed rules or endpoint definitions.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MigrationError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// The pipeline step this error was raised in.
    ///
    /// Configuration errors are raised before the pipeline starts and have no step.
    pub fn step(&self) -> Option<MigrationStep> {
        match self {
            Self::Dump { .. } => Some(MigrationStep::Dump),
            Self::TargetPreparation { .. } => Some(MigrationStep::PrepareTarget),
            Self::Backup { .. } => Some(MigrationStep::Backup),
            Self::Load { .. } => Some(MigrationStep::Load),
            Self::Persist { .. } => Some(MigrationStep::Persist),
            Self::Configuration(_) => None,
        }
    }

    /// The underlying executor failure, if any.
    pub fn process_error(&self) -> Option<&ProcessError> {
        match self {
            Self::Dump { source, .. }
            | Self::TargetPreparation { source, .. }
            | Self::Backup { source, .. }
            | Self::Load { source, .. } => Some(source),
            Self::Persist { .. } | Self::Configuration(_) => None,
        }
    }

    /// Check if the run stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.process_error().is_some_and(ProcessError::is_cancelled)
    }
}

//! CLI command implementations.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::config::{self, Config};
use crate::error::CliResult;

pub mod all;
pub mod db;
pub mod files;
pub mod init;
pub mod validate;
pub mod version;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Config file path
    pub config_path: PathBuf,
    /// Compose file of the local environment
    pub compose_file: PathBuf,
    /// Fired on Ctrl-C
    pub cancel: CancellationToken,
}

impl CommandContext {
    /// Resolve the global options.
    pub fn new(cli: &Cli, cancel: CancellationToken) -> Self {
        Self {
            config_path: cli.config.clone(),
            compose_file: cli
                .compose_file
                .clone()
                .unwrap_or_else(config::default_compose_file),
            cancel,
        }
    }

    /// Load and validate the config file.
    pub fn load_config(&self) -> CliResult<Config> {
        let config = Config::load(&self.config_path)?;
        config.validate(&self.compose_file)?;
        Ok(config)
    }
}

//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{COMPOSE_FILE_ENV, CONFIG_FILE_NAME};

/// dsync - Sync files and databases between environments
#[derive(Parser, Debug)]
#[command(name = "dsync")]
#[command(version)]
#[command(
    about = "dsync - Sync files and databases between a remote host and a local environment",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Compose file of the local environment [default: ~/www/dev/docker-compose.yml]
    #[arg(long, global = true, env = COMPOSE_FILE_ENV)]
    pub compose_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an example config file
    Init(InitArgs),

    /// Check the config file without touching any database
    Validate,

    /// Migrate the database between remote and local
    Db(DbArgs),

    /// Mirror the configured directories with rsync
    Files(FilesArgs),

    /// Mirror files, then migrate the database
    All(DbArgs),

    /// Display version information
    Version,
}

// =============================================================================
// Init Command
// =============================================================================

/// Arguments for the `init` command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(short, long)]
    pub force: bool,
}

// =============================================================================
// Db Command
// =============================================================================

/// Arguments for the `db` and `all` commands
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct DbArgs {
    /// Push local to remote instead of pulling remote to local
    #[arg(short, long)]
    pub reverse: bool,

    /// Also save the rewritten dump to a file
    #[arg(long)]
    pub dump: bool,

    /// Skip the confirmation before overwriting the remote database
    #[arg(short, long)]
    pub yes: bool,
}

// =============================================================================
// Files Command
// =============================================================================

/// Arguments for the `files` command
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct FilesArgs {
    /// Push local to remote instead of pulling remote to local
    #[arg(short, long)]
    pub reverse: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["dsync", "db"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE_NAME));
        match cli.command {
            Command::Db(args) => {
                assert!(!args.reverse);
                assert!(!args.dump);
                assert!(!args.yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["dsync", "all", "-r", "--dump", "-y", "-c", "site.json"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("site.json"));
        match cli.command {
            Command::All(args) => assert!(args.reverse && args.dump && args.yes),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

//! dsync CLI - Sync files and databases between environments.

use clap::Parser;
use tokio_util::sync::CancellationToken;

use dsync_cli::cli::{Cli, Command};
use dsync_cli::commands::{self, CommandContext};
use dsync_cli::error::CliResult;
use dsync_cli::output;

#[tokio::main]
async fn main() {
    dsync_migrate::logging::init();

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Received Ctrl-C");
            signal.cancel();
        }
    });

    // Run the CLI and handle errors
    if let Err(e) = run(cancel).await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

async fn run(cancel: CancellationToken) -> CliResult<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    let ctx = CommandContext::new(&cli, cancel);

    // Run the appropriate command
    match cli.command {
        Command::Init(args) => commands::init::run(args, &ctx).await,
        Command::Validate => commands::validate::run(&ctx).await,
        Command::Db(args) => commands::db::run(args, &ctx).await,
        Command::Files(args) => commands::files::run(args, &ctx).await,
        Command::All(args) => commands::all::run(args, &ctx).await,
        Command::Version => commands::version::run().await,
    }
}

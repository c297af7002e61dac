//! `dsync files` command - Mirror the configured directories.

use dsync_migrate::{FileSync, MigrationDirection, SyncReport, SystemExecutor};

use crate::cli::FilesArgs;
use crate::commands::CommandContext;
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::output::{self, success};

/// Run the files command
pub async fn run(args: FilesArgs, ctx: &CommandContext) -> CliResult<()> {
    let config = ctx.load_config()?;
    let report = sync_files(&config, MigrationDirection::from_reverse(args.reverse), ctx).await?;
    check_report(&report)
}

/// Mirror every sync path of `config` in `direction`.
pub(crate) async fn sync_files(
    config: &Config,
    direction: MigrationDirection,
    ctx: &CommandContext,
) -> CliResult<SyncReport> {
    output::header(&format!("Sync files ({})", direction));

    if config.sync.is_empty() {
        output::info("No sync paths configured");
        return Ok(SyncReport::default());
    }

    let sync = FileSync::new(SystemExecutor, config.rsync_target()?, config.sync.clone());
    let plan = sync.plan(direction);
    let width = plan.iter().map(|t| t.source.len()).max().unwrap_or(0);

    for transfer in &plan {
        output::list_item(&format!(
            "{:<width$} -> {}",
            transfer.source,
            transfer.destination,
            width = width
        ));
        for pattern in &transfer.exclude {
            output::dim(&format!("      excluding {}", pattern));
        }
    }
    output::newline();

    let report = sync.sync(direction, &ctx.cancel).await?;

    for failure in &report.failed {
        output::error(&format!("{}: {}", failure.transfer.source, failure.error));
    }
    if report.is_success() {
        success(&format!("Synced {} path(s)", report.synced.len()));
    }

    Ok(report)
}

/// Turn failed paths into an error.
pub(crate) fn check_report(report: &SyncReport) -> CliResult<()> {
    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::Sync(format!(
            "{} of {} path(s) failed",
            report.failed.len(),
            report.failed.len() + report.synced.len()
        )))
    }
}

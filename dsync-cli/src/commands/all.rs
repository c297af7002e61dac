//! `dsync all` command - Mirror files, then migrate the database.

use dsync_migrate::MigrationDirection;

use crate::cli::DbArgs;
use crate::commands::{CommandContext, db, files};
use crate::error::CliResult;
use crate::output;

/// Run the all command
pub async fn run(mut args: DbArgs, ctx: &CommandContext) -> CliResult<()> {
    let config = ctx.load_config()?;
    let direction = MigrationDirection::from_reverse(args.reverse);

    // A reverse run is confirmed once, before the first file is pushed.
    if direction.requires_backup() && !args.yes {
        let endpoints = config.endpoints(&ctx.compose_file)?;
        let warning = format!(
            "This overwrites {} synced path(s) on {} and the {} database. \
             A database backup is taken first.",
            config.sync.len(),
            config.ssh_host,
            endpoints.destination(direction).label()
        );
        if !db::confirm_overwrite(&warning) {
            return Ok(());
        }
        args.yes = true;
    }

    // Failed paths do not block the database; they are reported at the end.
    let report = files::sync_files(&config, direction, ctx).await?;
    if !report.is_success() {
        output::warn("Some paths failed to sync, continuing with the database");
    }

    db::migrate_database(&config, args, ctx).await?;
    files::check_report(&report)
}

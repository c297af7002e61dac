//! `dsync db` command - Migrate the database between remote and local.

use dsync_migrate::{
    MigrationDirection, MigrationObserver, MigrationStep, Migrator, MigratorConfig,
    ShellProvider, SystemExecutor,
};

use crate::cli::DbArgs;
use crate::commands::CommandContext;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::{self, confirm, kv, success};

/// Run the db command
pub async fn run(args: DbArgs, ctx: &CommandContext) -> CliResult<()> {
    let config = ctx.load_config()?;
    migrate_database(&config, args, ctx).await
}

/// Migrate the database described by `config`.
pub(crate) async fn migrate_database(
    config: &Config,
    args: DbArgs,
    ctx: &CommandContext,
) -> CliResult<()> {
    let direction = MigrationDirection::from_reverse(args.reverse);
    let endpoints = config.endpoints(&ctx.compose_file)?;
    let rules = config.rule_set()?;

    output::header(&format!("Migrate database ({})", direction));
    kv("Source", &endpoints.source(direction).label());
    kv("Destination", &endpoints.destination(direction).label());
    kv("Replacements", &rules.len().to_string());
    output::newline();

    if direction.requires_backup() && !args.yes {
        let warning = format!(
            "This overwrites the {} database. A backup is taken first.",
            endpoints.destination(direction).label()
        );
        if !confirm_overwrite(&warning) {
            return Ok(());
        }
    }

    let migrator = Migrator::new(ShellProvider::new(SystemExecutor), endpoints, rules)
        .with_config(MigratorConfig::new().dump_dir(config.dump_dir()))
        .with_observer(ProgressObserver);

    let report = migrator.migrate(direction, args.dump, &ctx.cancel).await?;

    output::newline();
    success("Database migrated!");
    kv("Dumped", &format!("{} bytes", report.dump_bytes));
    kv("Loaded", &format!("{} bytes", report.loaded_bytes));
    if let Some(backup) = &report.backup {
        kv("Backup", backup);
    }
    if let Some(path) = &report.persisted_to {
        kv("Saved dump", &path.display().to_string());
    }
    kv("Duration", &format!("{}ms", report.duration_ms));

    Ok(())
}

/// Ask before overwriting the remote side; prints "Aborted" when declined.
pub(crate) fn confirm_overwrite(warning: &str) -> bool {
    output::warn(warning);
    if !confirm("Continue?") {
        output::info("Aborted");
        return false;
    }
    output::newline();
    true
}

/// Prints each pipeline step as it starts.
struct ProgressObserver;

impl MigrationObserver for ProgressObserver {
    fn step_started(&self, step: MigrationStep, index: usize, total: usize) {
        output::step(index, total, step_label(step));
    }
}

fn step_label(step: MigrationStep) -> &'static str {
    match step {
        MigrationStep::Dump => "Dumping source database...",
        MigrationStep::Transform => "Applying replacements...",
        MigrationStep::Persist => "Saving dump...",
        MigrationStep::PrepareTarget => "Preparing destination database...",
        MigrationStep::Backup => "Backing up destination database...",
        MigrationStep::Load => "Loading dump into destination...",
    }
}

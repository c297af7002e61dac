//! `dsync init` command - Generate an example config file.

use crate::cli::InitArgs;
use crate::commands::CommandContext;
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::output::{self, success};

/// Run the init command
pub async fn run(args: InitArgs, ctx: &CommandContext) -> CliResult<()> {
    let path = &ctx.config_path;

    if path.exists() && !args.force {
        return Err(CliError::Config(format!(
            "{} already exists, use --force to overwrite it",
            path.display()
        )));
    }

    Config::example().save(path)?;

    success(&format!("Generated {}", path.display()));
    output::newline();

    output::section("Next steps");
    output::list_item("Set sshHost, port and the database names");
    output::list_item("Adjust dbReplace and sync for your project");
    output::list_item("Run `dsync validate` to check the result");

    Ok(())
}

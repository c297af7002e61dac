//! `dsync validate` command - Check the config file.

use dsync_migrate::{MigrationDirection, RuleSet};

use crate::commands::CommandContext;
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::output::{self, kv, success};

/// Run the validate command
pub async fn run(ctx: &CommandContext) -> CliResult<()> {
    output::header("Validate Config");

    kv("Config", &ctx.config_path.display().to_string());
    kv("Compose file", &ctx.compose_file.display().to_string());
    output::newline();

    let config = Config::load(&ctx.config_path)?;

    let problems = config.problems(&ctx.compose_file);
    if !problems.is_empty() {
        output::section("Errors");
        for problem in &problems {
            output::list_item(problem);
        }
        output::newline();
        return Err(CliError::Validation(format!(
            "{} problem(s) found in {}",
            problems.len(),
            ctx.config_path.display()
        )));
    }

    let endpoints = config.endpoints(&ctx.compose_file)?;
    output::section("Endpoints");
    kv("Remote", &format!("{} via {}", endpoints.remote().label(), endpoints.remote().transport));
    kv("Local", &format!("{} via {}", endpoints.local().label(), endpoints.local().transport));
    output::newline();

    let rules = config.rule_set()?;
    for direction in [MigrationDirection::Forward, MigrationDirection::Reverse] {
        print_rules(direction, &rules);
    }

    if !config.sync.is_empty() {
        output::section("Sync paths");
        for path in &config.sync {
            output::list_item(&format!("{} <-> {}", path.remote, path.local));
        }
        output::newline();
    }

    success("Config is valid!");
    Ok(())
}

fn print_rules(direction: MigrationDirection, rules: &RuleSet) {
    output::section(&format!("Replacements ({})", direction));
    let rules = rules.for_direction(direction);
    if rules.is_empty() {
        output::dim("  none");
    }
    for (index, rule) in rules.iter().enumerate() {
        output::numbered_item(index + 1, &format!("{} -> {}", rule.from, rule.to));
    }
    output::newline();
}

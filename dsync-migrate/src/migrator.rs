//! The migration pipeline.
//!
//! A run is strictly sequential:
//!
//! ```text
//! Dump(source) → Transform → [Persist] → PrepareTarget(destination)
//!              → [Backup(destination), reverse only] → Load(destination)
//! ```
//!
//! The first failing step stops the run. Completed steps are not undone; the
//! backup taken before a reverse load is the recovery path for the only
//! destructive step.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::direction::MigrationDirection;
use crate::endpoint::Endpoints;
use crate::error::{MigrateResult, MigrationError};
use crate::provider::DatabaseProvider;
use crate::replace::RuleSet;

/// A step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationStep {
    /// Read the source database.
    Dump,
    /// Rewrite the dump with the direction-correct rules.
    Transform,
    /// Save the rewritten dump to a local file.
    Persist,
    /// Ensure the destination database and principal exist.
    PrepareTarget,
    /// Snapshot the destination before overwriting it.
    Backup,
    /// Write the rewritten dump into the destination.
    Load,
}

impl MigrationStep {
    /// The steps of a run, in execution order.
    pub fn sequence(direction: MigrationDirection, persist: bool) -> Vec<MigrationStep> {
        let mut steps = vec![MigrationStep::Dump, MigrationStep::Transform];
        if persist {
            steps.push(MigrationStep::Persist);
        }
        steps.push(MigrationStep::PrepareTarget);
        if direction.requires_backup() {
            steps.push(MigrationStep::Backup);
        }
        steps.push(MigrationStep::Load);
        steps
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationStep::Dump => "dump",
            MigrationStep::Transform => "transform",
            MigrationStep::Persist => "persist",
            MigrationStep::PrepareTarget => "prepare target",
            MigrationStep::Backup => "backup",
            MigrationStep::Load => "load",
        };
        f.write_str(name)
    }
}

/// Progress callbacks for a run.
pub trait MigrationObserver: Send + Sync {
    /// Called before `step` starts. `index` is 1-based.
    fn step_started(&self, _step: MigrationStep, _index: usize, _total: usize) {}

    /// Called after `step` completed successfully.
    fn step_completed(&self, _step: MigrationStep) {}
}

/// Observer that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MigrationObserver for NoopObserver {}

/// Configuration for the migrator.
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Directory the transformed dump is saved to when persistence is requested.
    pub dump_dir: PathBuf,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            dump_dir: PathBuf::from("."),
        }
    }
}

impl MigratorConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dump directory.
    pub fn dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = dir.into();
        self
    }

    /// Where the transformed dump for `direction` is saved.
    pub fn dump_path(&self, direction: MigrationDirection) -> PathBuf {
        self.dump_dir.join(direction.dump_file_name())
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// Direction of the run.
    pub direction: MigrationDirection,
    /// Source endpoint label.
    pub source: String,
    /// Destination endpoint label.
    pub destination: String,
    /// Size of the dump as read from the source.
    pub dump_bytes: usize,
    /// Size of the dump after rewriting.
    pub loaded_bytes: usize,
    /// Number of rules applied.
    pub rules_applied: usize,
    /// Local file the transformed dump was saved to.
    pub persisted_to: Option<PathBuf>,
    /// Location of the destination backup (reverse runs).
    pub backup: Option<String>,
    /// Total duration in milliseconds.
    pub duration_ms: i64,
}

impl MigrationReport {
    /// Get a summary of the run.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "{} -> {} ({} bytes)",
            self.source, self.destination, self.loaded_bytes
        )];

        if let Some(backup) = &self.backup {
            parts.push(format!("backup {}", backup));
        }

        if let Some(path) = &self.persisted_to {
            parts.push(format!("saved {}", path.display()));
        }

        format!("{} in {}ms", parts.join(", "), self.duration_ms)
    }
}

/// Runs the dump → transform → load pipeline between two endpoints.
pub struct Migrator<P: DatabaseProvider> {
    provider: P,
    endpoints: Endpoints,
    rules: RuleSet,
    config: MigratorConfig,
    observer: Box<dyn MigrationObserver>,
}

impl<P: DatabaseProvider> Migrator<P> {
    /// Create a new migrator.
    pub fn new(provider: P, endpoints: Endpoints, rules: RuleSet) -> Self {
        Self {
            provider,
            endpoints,
            rules,
            config: MigratorConfig::default(),
            observer: Box::new(NoopObserver),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: MigratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the progress observer.
    pub fn with_observer(mut self, observer: impl MigrationObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// The provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The rules, in forward order.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Migrate the database in `direction`.
    ///
    /// With `persist` set, the transformed dump is written to
    /// [`MigratorConfig::dump_path`] before the destination is touched.
    pub async fn migrate(
        &self,
        direction: MigrationDirection,
        persist: bool,
        cancel: &CancellationToken,
    ) -> MigrateResult<MigrationReport> {
        let start = Instant::now();
        let source = self.endpoints.source(direction);
        let destination = self.endpoints.destination(direction);
        let total = MigrationStep::sequence(direction, persist).len();
        let mut index = 0;

        info!(
            direction = %direction,
            source = %source.label(),
            destination = %destination.label(),
            "Starting database migration"
        );

        let mut begin = |step: MigrationStep| {
            index += 1;
            self.observer.step_started(step, index, total);
            step
        };

        // Dump
        let step = begin(MigrationStep::Dump);
        let dump = self
            .provider
            .dump(source, cancel)
            .await
            .map_err(|source_err| MigrationError::Dump {
                endpoint: source.label(),
                source: source_err,
            })?;
        debug!(bytes = dump.len(), "Dump received");
        self.observer.step_completed(step);

        // Transform
        let step = begin(MigrationStep::Transform);
        let rules = self.rules.for_direction(direction);
        let transformed = rules.apply(&dump);
        debug!(
            rules = rules.len(),
            bytes_in = dump.len(),
            bytes_out = transformed.len(),
            "Replacements applied"
        );
        self.observer.step_completed(step);

        // Persist
        let persisted_to = if persist {
            let step = begin(MigrationStep::Persist);
            let path = self.config.dump_path(direction);
            tokio::fs::write(&path, transformed.as_bytes())
                .await
                .map_err(|source_err| MigrationError::Persist {
                    path: path.clone(),
                    source: source_err,
                })?;
            info!(path = %path.display(), "Saved transformed dump");
            self.observer.step_completed(step);
            Some(path)
        } else {
            None
        };

        // Prepare target
        let step = begin(MigrationStep::PrepareTarget);
        self.provider
            .prepare_target(destination, cancel)
            .await
            .map_err(|source_err| MigrationError::TargetPreparation {
                endpoint: destination.label(),
                source: source_err,
            })?;
        self.observer.step_completed(step);

        // Backup
        let backup = if direction.requires_backup() {
            let step = begin(MigrationStep::Backup);
            let location = self
                .provider
                .backup(destination, cancel)
                .await
                .map_err(|source_err| MigrationError::Backup {
                    endpoint: destination.label(),
                    source: source_err,
                })?;
            info!(endpoint = %destination.label(), backup = %location, "Backed up destination");
            self.observer.step_completed(step);
            Some(location)
        } else {
            None
        };

        // Load
        let step = begin(MigrationStep::Load);
        self.provider
            .load(destination, &transformed, cancel)
            .await
            .map_err(|source_err| MigrationError::Load {
                endpoint: destination.label(),
                source: source_err,
            })?;
        self.observer.step_completed(step);

        let report = MigrationReport {
            direction,
            source: source.label(),
            destination: destination.label(),
            dump_bytes: dump.len(),
            loaded_bytes: transformed.len(),
            rules_applied: rules.len(),
            persisted_to,
            backup,
            duration_ms: start.elapsed().as_millis() as i64,
        };

        info!(summary = %report.summary(), "Database migration complete");
        Ok(report)
    }
}

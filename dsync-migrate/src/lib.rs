//! # dsync-migrate
//!
//! Migration engine for dsync.
//!
//! This crate provides functionality for:
//! - Dumping a MySQL/MariaDB database on a remote host (over SSH) or in a
//!   local compose service
//! - Rewriting environment-specific literals in the dump with ordered,
//!   reversible replacement rules
//! - Preparing the destination database and its principal
//! - Backing up the remote database before it is overwritten
//! - Loading the rewritten dump into the destination
//! - Mirroring file trees with `rsync`
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────┐
//! │ Dump source  │────▶│ Replacement    │────▶│ Persist      │
//! └──────────────┘     │ rules          │     │ (optional)   │
//!                      └────────────────┘     └──────────────┘
//!                              │
//!                              ▼
//!                      ┌────────────────┐     ┌──────────────┐
//!                      │ Prepare target │────▶│ Backup       │
//!                      └────────────────┘     │ (reverse)    │
//!                                             └──────────────┘
//!                                                    │
//!                                                    ▼
//!                                             ┌──────────────┐
//!                                             │ Load         │
//!                                             └──────────────┘
//! ```
//!
//! All database work goes through the [`DatabaseProvider`] trait and all
//! external commands through [`ProcessExecutor`], so the pipeline can be
//! exercised without real databases.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dsync_migrate::{
//!     Endpoint, Endpoints, MigrationDirection, Migrator, ReplacementRule, RuleSet,
//!     ShellProvider, SystemExecutor,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! async fn pull() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoints = Endpoints::new(
//!         Endpoint::ssh("shop", "deploy@example.com", 22).with_principal_password("s3cr3t"),
//!         Endpoint::compose("shop_dev", "docker-compose.yml", "mariadb"),
//!     )?;
//!     let rules = RuleSet::new([ReplacementRule::new(
//!         "https://shop.example.com",
//!         "http://shop.test",
//!     )])?;
//!
//!     let migrator = Migrator::new(ShellProvider::new(SystemExecutor), endpoints, rules);
//!     let report = migrator
//!         .migrate(MigrationDirection::Forward, false, &CancellationToken::new())
//!         .await?;
//!     println!("{}", report.summary());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Replacement rules
//!
//! Rules are applied in order, each one to the output of the previous one.
//! A pattern containing `/` also matches its `\/` and `\\/` escaped forms.
//! Running in reverse swaps every pair and reverses the list, so a
//! forward-then-reverse round trip restores text that contains none of the
//! rules' targets.

pub mod backup;
pub mod direction;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod logging;
pub mod migrator;
pub mod prepare;
pub mod provider;
pub mod replace;
pub mod sync;

// Re-exports
pub use backup::{backup_file_name, backup_file_name_now, backup_path};
pub use direction::{MigrationDirection, Side};
pub use endpoint::{Endpoint, Endpoints, Transport};
pub use error::{MigrateResult, MigrationError, ProcessError, ProcessResult};
pub use executor::{Invocation, ProcessExecutor, SystemExecutor};
pub use migrator::{
    MigrationObserver, MigrationReport, MigrationStep, Migrator, MigratorConfig, NoopObserver,
};
pub use prepare::ensure_target_sql;
pub use provider::{DatabaseProvider, ShellProvider};
pub use replace::{ReplacementRule, RuleSet, apply_replacements};
pub use sync::{FileSync, RsyncTarget, SyncFailure, SyncPath, SyncReport, Transfer};

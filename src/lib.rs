//! # dsync
//!
//! Move a MySQL/MariaDB database and its file trees between a remote host
//! and a local Docker Compose stack, rewriting environment-specific values
//! on the way.
//!
//! dsync provides:
//! - A dump → rewrite → load pipeline in both directions
//! - Ordered, reversible replacement rules that also match JSON-escaped slashes
//! - Automatic remote backups before a reverse migration overwrites anything
//! - `rsync` mirroring of configured directories
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dsync::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoints = Endpoints::new(
//!         Endpoint::ssh("shop", "deploy@example.com", 22).with_principal_password("s3cr3t"),
//!         Endpoint::compose("shop_dev", "docker-compose.yml", "mariadb"),
//!     )?;
//!     let rules = RuleSet::new([ReplacementRule::new(
//!         "https://shop.example.com",
//!         "http://shop.test",
//!     )])?;
//!
//!     Migrator::new(ShellProvider::new(SystemExecutor), endpoints, rules)
//!         .migrate(MigrationDirection::Forward, false, &CancellationToken::new())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The migration engine.
pub mod migrate {
    pub use dsync_migrate::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        DatabaseProvider, Endpoint, Endpoints, FileSync, MigrationDirection, MigrationError,
        Migrator, MigratorConfig, ProcessExecutor, ReplacementRule, RsyncTarget, RuleSet,
        ShellProvider, SyncPath, SystemExecutor,
    };
}

// Re-export key types at the crate root
pub use migrate::{MigrateResult, MigrationError, ProcessError};

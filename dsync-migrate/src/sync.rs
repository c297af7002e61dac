//! File-tree mirroring with `rsync` over SSH.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::direction::MigrationDirection;
use crate::error::{ProcessError, ProcessResult};
use crate::executor::{Invocation, ProcessExecutor};

/// A directory pair to mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPath {
    /// Directory on the SSH host.
    pub remote: String,
    /// Directory on this machine.
    pub local: String,
    /// rsync exclude patterns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl SyncPath {
    /// Create a path pair without excludes.
    pub fn new(remote: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            local: local.into(),
            exclude: Vec::new(),
        }
    }

    /// Add an exclude pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }
}

/// The SSH host the remote side of every [`SyncPath`] lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsyncTarget {
    /// `user@host` or an SSH config alias.
    pub host: String,
    /// SSH port.
    pub port: u16,
}

impl RsyncTarget {
    /// Create a target.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// One resolved transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// rsync source argument.
    pub source: String,
    /// rsync destination argument.
    pub destination: String,
    /// Exclude patterns.
    pub exclude: Vec<String>,
}

/// A path that could not be mirrored.
#[derive(Debug)]
pub struct SyncFailure {
    /// The failed transfer.
    pub transfer: Transfer,
    /// Why it failed.
    pub error: ProcessError,
}

/// Outcome of a mirroring run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Transfers that completed.
    pub synced: Vec<Transfer>,
    /// Transfers that failed.
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    /// Check if every transfer completed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Mirrors [`SyncPath`]s between this machine and an SSH host.
pub struct FileSync<E> {
    executor: E,
    target: RsyncTarget,
    paths: Vec<SyncPath>,
}

impl<E: ProcessExecutor> FileSync<E> {
    /// Create a file sync.
    pub fn new(executor: E, target: RsyncTarget, paths: Vec<SyncPath>) -> Self {
        Self {
            executor,
            target,
            paths,
        }
    }

    /// The configured paths.
    pub fn paths(&self) -> &[SyncPath] {
        &self.paths
    }

    /// Resolve every path into an rsync source/destination pair for `direction`.
    pub fn plan(&self, direction: MigrationDirection) -> Vec<Transfer> {
        self.paths
            .iter()
            .map(|path| {
                let remote = format!("{}:{}", self.target.host, with_trailing_slash(&path.remote));
                let local = with_trailing_slash(&path.local);
                let (source, destination) = match direction {
                    MigrationDirection::Forward => (remote, local),
                    MigrationDirection::Reverse => (local, remote),
                };
                Transfer {
                    source,
                    destination,
                    exclude: path.exclude.clone(),
                }
            })
            .collect()
    }

    /// Build the rsync invocation for `transfer`.
    pub fn invocation(&self, transfer: &Transfer) -> Invocation {
        Invocation::new("rsync")
            .arg("-azr")
            .arg("-e")
            .arg(format!("ssh -p {}", self.target.port))
            .args(transfer.exclude.iter().map(|x| format!("--exclude={}", x)))
            .arg(transfer.source.as_str())
            .arg(transfer.destination.as_str())
    }

    /// Mirror every path in `direction`.
    ///
    /// A failing path is recorded and the remaining paths still run.
    /// Cancellation stops the run and is returned as an error.
    pub async fn sync(
        &self,
        direction: MigrationDirection,
        cancel: &CancellationToken,
    ) -> ProcessResult<SyncReport> {
        let mut report = SyncReport::default();

        for transfer in self.plan(direction) {
            if cancel.is_cancelled() {
                return Err(ProcessError::cancelled("rsync"));
            }

            info!(
                source = %transfer.source,
                destination = %transfer.destination,
                excludes = transfer.exclude.len(),
                "Syncing files"
            );

            match self.executor.run(&self.invocation(&transfer), cancel).await {
                Ok(_) => report.synced.push(transfer),
                Err(err) if err.is_cancelled() => return Err(err),
                Err(error) => {
                    warn!(source = %transfer.source, error = %error, "File sync failed");
                    report.failed.push(SyncFailure { transfer, error });
                }
            }
        }

        Ok(report)
    }
}

/// Append `/` unless the path already ends with one.
pub fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Records invocations; fails those whose source contains `fail_on`.
    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<Invocation>>,
        fail_on: Option<&'static str>,
        cancel_after_first: Option<CancellationToken>,
    }

    #[async_trait::async_trait]
    impl ProcessExecutor for RecordingExecutor {
        async fn run(
            &self,
            invocation: &Invocation,
            _cancel: &CancellationToken,
        ) -> ProcessResult<Vec<u8>> {
            self.calls.lock().unwrap().push(invocation.clone());
            if let Some(token) = &self.cancel_after_first {
                token.cancel();
            }
            match self.fail_on {
                Some(needle) if invocation.args.iter().any(|a| a.contains(needle)) => Err(
                    ProcessError::failed("rsync", Some(23), "some files could not be transferred"),
                ),
                _ => Ok(Vec::new()),
            }
        }
    }

    fn paths() -> Vec<SyncPath> {
        vec![
            SyncPath::new("/var/www/shop/uploads", "./uploads").exclude("cache"),
            SyncPath::new("/var/www/shop/media/", "./media/"),
        ]
    }

    fn target() -> RsyncTarget {
        RsyncTarget::new("deploy@example.com", 2222)
    }

    #[test]
    fn test_with_trailing_slash() {
        assert_eq!(with_trailing_slash(""), "/");
        assert_eq!(with_trailing_slash("/path/to/dir"), "/path/to/dir/");
        assert_eq!(with_trailing_slash("/path/to/dir/"), "/path/to/dir/");
        assert_eq!(with_trailing_slash("/"), "/");
    }

    #[test]
    fn test_forward_invocation() {
        let sync = FileSync::new(RecordingExecutor::default(), target(), paths());
        let transfer = &sync.plan(MigrationDirection::Forward)[0];

        assert_eq!(
            sync.invocation(transfer).args,
            vec![
                "-azr",
                "-e",
                "ssh -p 2222",
                "--exclude=cache",
                "deploy@example.com:/var/www/shop/uploads/",
                "./uploads/",
            ]
        );
    }

    #[test]
    fn test_reverse_plan_swaps_sides() {
        let sync = FileSync::new(RecordingExecutor::default(), target(), paths());
        let plan = sync.plan(MigrationDirection::Reverse);

        assert_eq!(plan[1].source, "./media/");
        assert_eq!(plan[1].destination, "deploy@example.com:/var/www/shop/media/");
        assert!(plan[1].exclude.is_empty());
    }

    #[tokio::test]
    async fn test_failed_path_does_not_stop_run() {
        let executor = RecordingExecutor {
            fail_on: Some("uploads"),
            ..Default::default()
        };
        let sync = FileSync::new(executor, target(), paths());

        let report = sync
            .sync(MigrationDirection::Forward, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.synced.len(), 1);
        assert_eq!(report.synced[0].destination, "./media/");
        assert_eq!(sync.executor.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_stops_run() {
        let cancel = CancellationToken::new();
        let executor = RecordingExecutor {
            cancel_after_first: Some(cancel.clone()),
            ..Default::default()
        };
        let sync = FileSync::new(executor, target(), paths());

        let err = sync
            .sync(MigrationDirection::Forward, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(sync.executor.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_sync_path_deserialize_without_exclude() {
        let path: SyncPath =
            serde_json::from_str(r#"{"remote": "/srv/files", "local": "./files"}"#).unwrap();
        assert_eq!(path, SyncPath::new("/srv/files", "./files"));
    }
}

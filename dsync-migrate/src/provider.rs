//! Database operations on an endpoint.
//!
//! [`DatabaseProvider`] is the seam the migrator is written against.
//! [`ShellProvider`] implements it with the stock MySQL/MariaDB tools, reached
//! through `ssh` for the remote side and `docker compose exec` for the local
//! side.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backup::{backup_file_name_now, backup_path};
use crate::endpoint::{Endpoint, Transport};
use crate::error::{ProcessError, ProcessResult};
use crate::executor::{Invocation, ProcessExecutor};
use crate::prepare::ensure_target_sql;

/// Dump flag keeping binary columns as hex so the dump stays valid UTF-8.
const HEX_BLOB_FLAG: &str = "--hex-blob";

/// Dump, prepare, back up and load a database endpoint.
#[async_trait::async_trait]
pub trait DatabaseProvider: Send + Sync {
    /// Return the full content of the endpoint's database as SQL text.
    async fn dump(&self, endpoint: &Endpoint, cancel: &CancellationToken) -> ProcessResult<String>;

    /// Create the database and its principal if they do not exist yet.
    async fn prepare_target(
        &self,
        endpoint: &Endpoint,
        cancel: &CancellationToken,
    ) -> ProcessResult<()>;

    /// Snapshot the database on the endpoint's side and return the backup's location.
    async fn backup(&self, endpoint: &Endpoint, cancel: &CancellationToken)
    -> ProcessResult<String>;

    /// Execute `sql` against the endpoint's database.
    async fn load(
        &self,
        endpoint: &Endpoint,
        sql: &str,
        cancel: &CancellationToken,
    ) -> ProcessResult<()>;
}

/// [`DatabaseProvider`] backed by external commands.
#[derive(Debug, Clone, Default)]
pub struct ShellProvider<E> {
    executor: E,
}

impl<E: ProcessExecutor> ShellProvider<E> {
    /// Create a provider running commands through `executor`.
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// The underlying executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Wrap `words` so they run next to the endpoint's database.
    fn command(&self, endpoint: &Endpoint, words: Vec<String>) -> Invocation {
        match &endpoint.transport {
            Transport::Ssh { host, port } => Invocation::new("ssh")
                .args(["-p".to_string(), port.to_string(), host.clone()])
                .arg(shell_join(&words)),
            Transport::Compose { file, service } => Invocation::new("docker")
                .args(["compose", "-f"])
                .arg(file.display().to_string())
                .args(["exec", "-T"])
                .arg(service.clone())
                .args(words),
        }
    }

    fn dump_words(endpoint: &Endpoint, program: &str) -> Vec<String> {
        let mut words = vec![program.to_string()];
        words.extend(endpoint.credential_args());
        words.push(HEX_BLOB_FLAG.to_string());
        words.push(endpoint.database.clone());
        words
    }

    fn client_words(endpoint: &Endpoint) -> Vec<String> {
        let mut words = vec![endpoint.transport.client_program().to_string()];
        words.extend(endpoint.credential_args());
        words
    }
}

#[async_trait::async_trait]
impl<E: ProcessExecutor> DatabaseProvider for ShellProvider<E> {
    async fn dump(&self, endpoint: &Endpoint, cancel: &CancellationToken) -> ProcessResult<String> {
        let mut last_failure = None;

        for program in endpoint.transport.dump_programs() {
            let invocation = self.command(endpoint, Self::dump_words(endpoint, program));
            debug!(endpoint = %endpoint.label(), program = program, "Dumping database");

            match self.executor.run(&invocation, cancel).await {
                Ok(stdout) => {
                    return String::from_utf8(stdout).map_err(|e| ProcessError::Io {
                        program: invocation.program.clone(),
                        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                    });
                }
                Err(err @ ProcessError::Failed { .. }) => {
                    warn!(
                        endpoint = %endpoint.label(),
                        program = program,
                        error = %err,
                        "Dump program failed, trying next"
                    );
                    last_failure = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_failure.unwrap_or_else(|| {
            ProcessError::failed("dump", None, "no dump program available for this transport")
        }))
    }

    async fn prepare_target(
        &self,
        endpoint: &Endpoint,
        cancel: &CancellationToken,
    ) -> ProcessResult<()> {
        let mut words = Self::client_words(endpoint);
        words.push("-e".to_string());
        words.push(ensure_target_sql(
            &endpoint.database,
            &endpoint.principal_password,
        ));

        debug!(endpoint = %endpoint.label(), "Ensuring database and principal exist");
        self.executor
            .run(&self.command(endpoint, words), cancel)
            .await?;
        Ok(())
    }

    async fn backup(
        &self,
        endpoint: &Endpoint,
        cancel: &CancellationToken,
    ) -> ProcessResult<String> {
        let path = backup_path(
            endpoint.backup_dir.as_deref(),
            &backup_file_name_now(&endpoint.database),
        );

        // One redirected dump per candidate program, first success wins.
        let script = endpoint
            .transport
            .dump_programs()
            .iter()
            .map(|program| {
                format!(
                    "{} > {}",
                    shell_join(&Self::dump_words(endpoint, program)),
                    shell_quote(&path)
                )
            })
            .collect::<Vec<_>>()
            .join(" || ");

        let invocation = match &endpoint.transport {
            Transport::Ssh { host, port } => Invocation::new("ssh")
                .args(["-p".to_string(), port.to_string(), host.clone()])
                .arg(script),
            Transport::Compose { .. } => self.command(
                endpoint,
                vec!["sh".to_string(), "-c".to_string(), script],
            ),
        };

        debug!(endpoint = %endpoint.label(), path = %path, "Backing up database");
        self.executor.run(&invocation, cancel).await?;
        Ok(path)
    }

    async fn load(
        &self,
        endpoint: &Endpoint,
        sql: &str,
        cancel: &CancellationToken,
    ) -> ProcessResult<()> {
        let mut words = Self::client_words(endpoint);
        words.push(endpoint.database.clone());

        debug!(endpoint = %endpoint.label(), bytes = sql.len(), "Loading dump");
        let invocation = self.command(endpoint, words).stdin(sql);
        self.executor.run(&invocation, cancel).await?;
        Ok(())
    }
}

/// Quote a word for a POSIX shell.
pub fn shell_quote(word: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "_-./=:@,+%".contains(c);

    if !word.is_empty() && word.chars().all(is_safe) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Join words into a single shell command line.
pub fn shell_join<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| shell_quote(w.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

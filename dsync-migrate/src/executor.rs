//! External command execution.
//!
//! Everything that touches real infrastructure (`ssh`, `docker compose`,
//! `rsync`, the MySQL/MariaDB tools) goes through [`ProcessExecutor`], so the
//! rest of the crate can be driven by in-memory doubles.

use std::fmt;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ProcessError, ProcessResult};

/// A single command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path.
    pub program: String,
    /// Arguments, passed without shell interpretation.
    pub args: Vec<String>,
    /// Data written to the program's standard input.
    pub stdin: Option<String>,
}

impl Invocation {
    /// Create an invocation with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed `input` to standard input.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Capability to run external commands.
#[async_trait::async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Run `invocation` to completion and return its standard output.
    ///
    /// When `cancel` fires the command is terminated and
    /// [`ProcessError::Cancelled`] is returned.
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> ProcessResult<Vec<u8>>;
}

#[async_trait::async_trait]
impl<E: ProcessExecutor + ?Sized> ProcessExecutor for std::sync::Arc<E> {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> ProcessResult<Vec<u8>> {
        (**self).run(invocation, cancel).await
    }
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    /// Create a new executor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ProcessExecutor for SystemExecutor {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> ProcessResult<Vec<u8>> {
        let program = invocation.program.as_str();

        if cancel.is_cancelled() {
            return Err(ProcessError::cancelled(program));
        }

        debug!(
            program = program,
            args = invocation.args.len(),
            stdin_bytes = invocation.stdin.as_ref().map_or(0, String::len),
            "Spawning command"
        );

        let mut child = Command::new(program)
            .args(&invocation.args)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdin = child.stdin.take();
        let feed = async {
            if let (Some(mut pipe), Some(input)) = (stdin, invocation.stdin.as_deref()) {
                pipe.write_all(input.as_bytes()).await?;
                pipe.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };

        let completed = async {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            let output = output.map_err(|source| ProcessError::Io {
                program: program.to_string(),
                source,
            })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                return Err(ProcessError::failed(program, output.status.code(), stderr));
            }

            // A write error only matters when the command itself claims success.
            fed.map_err(|source| ProcessError::Io {
                program: program.to_string(),
                source,
            })?;

            Ok(output.stdout)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(program = program, "Command cancelled");
                Err(ProcessError::cancelled(program))
            }
            result = completed => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let invocation = Invocation::new("ssh")
            .arg("deploy@example.com")
            .args(["-p", "2222"])
            .stdin("SELECT 1;");

        assert_eq!(invocation.args, vec!["deploy@example.com", "-p", "2222"]);
        assert_eq!(invocation.stdin.as_deref(), Some("SELECT 1;"));
        assert_eq!(invocation.to_string(), "ssh deploy@example.com -p 2222");
    }

    #[tokio::test]
    async fn test_already_cancelled_never_spawns() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = SystemExecutor
            .run(&Invocation::new("definitely-not-a-real-program"), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = SystemExecutor
            .run(
                &Invocation::new("definitely-not-a-real-program"),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdin_round_trip() {
        let output = SystemExecutor
            .run(
                &Invocation::new("cat").stdin("INSERT INTO t VALUES (1);"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(output, b"INSERT INTO t VALUES (1);");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit() {
        let err = SystemExecutor
            .run(
                &Invocation::new("sh").args(["-c", "echo boom >&2; exit 3"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        match err {
            ProcessError::Failed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_running_command() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = SystemExecutor
            .run(&Invocation::new("sleep").arg("10"), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }
}

pub mod device;
pub mod exchange;
pub mod host;

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::FetchError;

/// Captured output of one external command invocation.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes one external command line with a hard timeout.
///
/// Production uses [`ProcessRunner`]; tests inject scripted fakes so the
/// adapters can be exercised without adb or ssh on the machine.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        limit: Duration,
    ) -> Result<CmdOutput, FetchError>;
}

/// `CommandRunner` backed by real subprocesses via `tokio::process`.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        limit: Duration,
    ) -> Result<CmdOutput, FetchError> {
        let result = tokio::time::timeout(
            limit,
            Command::new(program).args(args).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| FetchError::Timeout(limit))?;

        let output = result.map_err(|e| FetchError::Transport(format!("{program}: {e}")))?;

        Ok(CmdOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}

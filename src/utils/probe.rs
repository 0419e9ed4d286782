//! Bounded, read-only command execution for grammar generators
//!
//! Generators sometimes need to look at the machine (installed plugins,
//! configured remotes) before deciding what grammar to hand back. They get a
//! [`ShellProbe`] instead of spawning processes themselves so the time budget
//! is enforced in one place.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{ProbeError, Result};

/// Default time budget for a single probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Captured output of a probe run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
}

impl ProbeOutput {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Capability handed to generators for running external commands
#[async_trait]
pub trait ShellProbe: Send + Sync {
    /// Run `command` with `args` and capture its output
    async fn execute(&self, command: &str, args: &[String]) -> Result<ProbeOutput>;
}

/// Probe backed by real child processes
#[derive(Debug, Clone)]
pub struct ProcessProbe {
    timeout: Duration,
    cwd: Option<PathBuf>,
}

impl ProcessProbe {
    /// Create a probe with the given time budget
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, cwd: None }
    }

    /// Run probes from `cwd` instead of the process working directory
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl ShellProbe for ProcessProbe {
    async fn execute(&self, command: &str, args: &[String]) -> Result<ProbeOutput> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(command, ?args, "running shell probe");
        let child = cmd.spawn().map_err(|e| ProbeError::SpawnFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProbeError::Timeout {
                command: command.to_string(),
                millis: self.timeout.as_millis() as u64,
            })??;

        Ok(ProbeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}

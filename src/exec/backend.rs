// src/exec/backend.rs

//! Pluggable process spawning.
//!
//! The session orchestrator talks to a `ProcessSpawner` instead of
//! `tokio::process` directly, so tests can swap in a fake that records
//! spawns and terminations without starting real processes.
//!
//! - `ShellProcessSpawner` is the production implementation: it runs the
//!   command through the platform shell in the watched directory. On Unix the
//!   shell leads a new process group so the runner and everything it starts
//!   can be signalled together.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::info;

use crate::errors::{Result, TeststreamError};

use super::process::{ProcessHandle, process_channel};
use super::task_runner::{forward_output, supervise};

/// Trait abstracting how the external test runner is started.
///
/// Implementations must be called from inside a Tokio runtime.
pub trait ProcessSpawner: Send + Sync {
    /// Start `command` with `directory` as its working directory.
    fn spawn(&self, command: &str, directory: &Path) -> Result<ProcessHandle>;
}

/// How long a terminated runner gets to exit after SIGTERM before its
/// process group is killed.
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Real spawner used in production.
#[derive(Debug, Clone, Copy)]
pub struct ShellProcessSpawner {
    grace: Duration,
}

impl ShellProcessSpawner {
    pub fn new() -> Self {
        Self {
            grace: DEFAULT_TERMINATE_GRACE,
        }
    }

    pub fn with_terminate_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

impl Default for ShellProcessSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSpawner for ShellProcessSpawner {
    fn spawn(&self, command: &str, directory: &Path) -> Result<ProcessHandle> {
        info!(dir = %directory.display(), cmd = %command, "starting test runner process");

        let mut cmd = shell_command(command);
        cmd.current_dir(directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| TeststreamError::Spawn {
            command: command.to_string(),
            source,
        })?;

        forward_output(&mut child, directory);

        let (handle, control) = process_channel(command, child.id());
        tokio::spawn(supervise(child, control, directory.to_path_buf(), self.grace));

        Ok(handle)
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

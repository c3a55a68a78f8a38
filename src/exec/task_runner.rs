// src/exec/task_runner.rs

//! Supervision of a single spawned test runner process.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tracing::{debug, error, info, warn};

use super::process::{ProcessControl, ProcessOutcome};

/// Wait for the child to exit, or stop its process tree once termination is
/// requested, then publish the outcome.
///
/// Termination waits for the child to be reaped before reporting, so a
/// caller awaiting `ProcessHandle::terminate` knows the runner is gone.
pub async fn supervise(
    mut child: Child,
    mut control: ProcessControl,
    dir: PathBuf,
    grace: Duration,
) {
    let pid = child.id();

    let outcome = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => {
                let code = status.code().unwrap_or(-1);
                info!(
                    dir = %dir.display(),
                    pid,
                    exit_code = code,
                    success = status.success(),
                    "test runner process exited"
                );
                ProcessOutcome::Exited(code)
            }
            Err(err) => {
                error!(dir = %dir.display(), pid, error = %err, "waiting for test runner process failed");
                ProcessOutcome::Failed
            }
        },

        _ = control.terminate_requested() => {
            info!(dir = %dir.display(), pid, "termination requested; stopping test runner");
            terminate_tree(&mut child, &dir, grace).await;
            ProcessOutcome::Terminated
        }
    };

    control.report_exit(outcome);
}

/// SIGTERM the runner's process group, give it `grace` to exit, then
/// SIGKILL whatever is left of the group. The shell itself is always reaped.
#[cfg(unix)]
async fn terminate_tree(child: &mut Child, dir: &Path, grace: Duration) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        // Already reaped; nothing left to signal through it.
        return;
    };
    // The shell was started with `process_group(0)`, so its pid is the pgid.
    let group = Pid::from_raw(pid as i32);

    if let Err(err) = killpg(group, Signal::SIGTERM) {
        debug!(dir = %dir.display(), pid, error = %err, "SIGTERM to process group failed");
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            debug!(dir = %dir.display(), pid, ?status, "test runner exited after SIGTERM");
        }
        Ok(Err(err)) => {
            warn!(dir = %dir.display(), pid, error = %err, "waiting for test runner failed");
        }
        Err(_) => {
            warn!(
                dir = %dir.display(),
                pid,
                grace_ms = grace.as_millis() as u64,
                "test runner ignored SIGTERM; killing its process group"
            );
        }
    }

    // Children that outlived the shell still carry its pgid; sweep them. The
    // pgid stays reserved while any member is alive.
    match killpg(group, Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(err) => warn!(dir = %dir.display(), pid, error = %err, "SIGKILL to process group failed"),
    }

    if let Err(err) = child.wait().await {
        warn!(dir = %dir.display(), pid, error = %err, "reaping test runner failed");
    }
}

/// Kill the runner and every process it started (`taskkill /T` on Windows),
/// then reap.
#[cfg(not(unix))]
async fn terminate_tree(child: &mut Child, dir: &Path, _grace: Duration) {
    #[cfg(windows)]
    if let Some(pid) = child.id() {
        let killed = tokio::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await;
        if let Err(err) = killed {
            warn!(dir = %dir.display(), pid, error = %err, "taskkill failed; killing the shell only");
        }
    }

    if let Err(err) = child.start_kill() {
        debug!(dir = %dir.display(), error = %err, "test runner already gone");
    }
    if let Err(err) = child.wait().await {
        warn!(dir = %dir.display(), error = %err, "reaping test runner failed");
    }
}

/// Always consume stdout/stderr so pipe buffers don't fill; log at debug.
pub fn forward_output(child: &mut Child, dir: &Path) {
    if let Some(stdout) = child.stdout.take() {
        let dir = dir.display().to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(dir = %dir, "stdout: {}", line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let dir = dir.display().to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(dir = %dir, "stderr: {}", line);
            }
        });
    }
}

// src/exec/process.rs

//! Handle to an external process: exit notification plus terminate.
//!
//! A spawner creates a connected pair with [`process_channel`]. The
//! [`ProcessHandle`] goes to the caller; the [`ProcessControl`] goes to
//! whatever actually supervises the process (a real child, or a fake in
//! tests) and reports how it ended.

use tokio::sync::{oneshot, watch};

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Exited on its own with this code (`-1` if killed by a signal).
    Exited(i32),
    /// Stopped because termination was requested.
    Terminated,
    /// Supervision failed (e.g. waiting on the child errored).
    Failed,
}

pub fn process_channel(
    command: impl Into<String>,
    pid: Option<u32>,
) -> (ProcessHandle, ProcessControl) {
    let (terminate_tx, terminate_rx) = oneshot::channel();
    let (exit_tx, exit_rx) = watch::channel(None);

    let handle = ProcessHandle {
        command: command.into(),
        pid,
        terminate: Some(terminate_tx),
        exit: exit_rx,
    };
    let control = ProcessControl {
        terminate: terminate_rx,
        exit: exit_tx,
    };
    (handle, control)
}

/// Caller side of a running process.
///
/// Dropping the handle counts as a termination request.
#[derive(Debug)]
pub struct ProcessHandle {
    command: String,
    pid: Option<u32>,
    terminate: Option<oneshot::Sender<()>>,
    exit: watch::Receiver<Option<ProcessOutcome>>,
}

impl ProcessHandle {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_running(&self) -> bool {
        self.exit.borrow().is_none()
    }

    pub fn outcome(&self) -> Option<ProcessOutcome> {
        *self.exit.borrow()
    }

    /// Independent observer of this process's exit, usable after the handle
    /// itself has been moved or dropped.
    pub fn exit_watcher(&self) -> ExitWatcher {
        ExitWatcher {
            exit: self.exit.clone(),
        }
    }

    /// Wait for the process to exit on its own.
    pub async fn exited(&self) -> ProcessOutcome {
        self.exit_watcher().wait().await
    }

    /// Request termination and wait until the process is gone.
    pub async fn terminate(&mut self) -> ProcessOutcome {
        if let Some(terminate) = self.terminate.take() {
            // Fails only if the process already exited.
            let _ = terminate.send(());
        }
        self.exited().await
    }
}

#[derive(Debug, Clone)]
pub struct ExitWatcher {
    exit: watch::Receiver<Option<ProcessOutcome>>,
}

impl ExitWatcher {
    pub async fn wait(&mut self) -> ProcessOutcome {
        let waited = self.exit.wait_for(Option::is_some).await.map(|outcome| *outcome);
        match waited {
            Ok(outcome) => outcome.unwrap_or(ProcessOutcome::Failed),
            // Supervisor vanished without reporting.
            Err(_) => self.exit.borrow().unwrap_or(ProcessOutcome::Failed),
        }
    }

    /// Whether this watcher belongs to `handle`'s process.
    pub fn watches(&self, handle: &ProcessHandle) -> bool {
        self.exit.same_channel(&handle.exit)
    }
}

/// Supervisor side of a running process.
#[derive(Debug)]
pub struct ProcessControl {
    terminate: oneshot::Receiver<()>,
    exit: watch::Sender<Option<ProcessOutcome>>,
}

impl ProcessControl {
    /// Resolves once termination was requested or the handle was dropped.
    pub async fn terminate_requested(&mut self) {
        let _ = (&mut self.terminate).await;
    }

    /// Publish the final outcome. Consumes the control: a process ends once.
    pub fn report_exit(self, outcome: ProcessOutcome) {
        self.exit.send_replace(Some(outcome));
    }
}

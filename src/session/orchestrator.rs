// src/session/orchestrator.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::{ProcessHandle, ProcessSpawner};
use crate::listener::ResultsListener;
use crate::session::classify::classify_batch;
use crate::session::command::CommandTemplate;
use crate::session::directories::TestDirectories;
use crate::session::observer::WatchObserver;

/// Process slot for one watched directory.
///
/// The async mutex serialises `start`/`stop` for that directory, which is
/// what keeps at most one live process per directory.
type Slot = Arc<tokio::sync::Mutex<Option<ProcessHandle>>>;

/// Runs one watch session (listener + test runner process) per directory.
///
/// Directories are independent: starting or stopping one never waits on
/// another. Slots are created on first use and kept for the orchestrator's
/// lifetime.
pub struct WatchOrchestrator {
    spawner: Arc<dyn ProcessSpawner>,
    directories: Arc<dyn TestDirectories>,
    command: CommandTemplate,
    sessions: Mutex<HashMap<PathBuf, Slot>>,
}

impl std::fmt::Debug for WatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchOrchestrator")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

impl WatchOrchestrator {
    pub fn new(
        spawner: Arc<dyn ProcessSpawner>,
        directories: Arc<dyn TestDirectories>,
        command: CommandTemplate,
    ) -> Self {
        Self {
            spawner,
            directories,
            command,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start (or restart) a session for every configured directory.
    pub async fn start_watch(&self, observer: Arc<dyn WatchObserver>) -> Result<()> {
        for dir in self.directories.test_directories() {
            info!(dir = %dir.display(), "starting watch");
            self.start(&dir, Arc::clone(&observer)).await?;
        }
        Ok(())
    }

    /// Start a session for `directory`.
    ///
    /// A process still running for the directory is terminated, and its
    /// termination awaited, before anything new is created. A bind failure
    /// is returned and no process is spawned.
    pub async fn start(&self, directory: &Path, observer: Arc<dyn WatchObserver>) -> Result<()> {
        let slot = self.slot_for(directory);
        let mut current = slot.lock().await;

        if let Some(mut existing) = current.take() {
            if existing.is_running() {
                info!(
                    dir = %directory.display(),
                    pid = existing.pid(),
                    "a test runner is already running for this directory; terminating it"
                );
                let outcome = existing.terminate().await;
                debug!(dir = %directory.display(), ?outcome, "previous test runner terminated");
            }
        }

        let mut listener = ResultsListener::bind().await?;
        let port = listener.port();
        listener.on_messages(move |batch| classify_batch(batch).dispatch(observer.as_ref()))?;

        let command = self.command.render(port);
        // On failure the listener is dropped here, which disposes it.
        let handle = self.spawner.spawn(&command, directory)?;

        let mut exit = handle.exit_watcher();
        let dir = directory.to_path_buf();
        let session_slot = Arc::clone(&slot);
        tokio::spawn(async move {
            let outcome = exit.wait().await;
            info!(dir = %dir.display(), port, ?outcome, "test runner ended; closing listener");
            listener.close().await;

            // A restart may already have installed the next process here.
            let mut current = session_slot.lock().await;
            if current.as_ref().is_some_and(|handle| exit.watches(handle)) {
                current.take();
                debug!(dir = %dir.display(), "watch session cleared");
            }
        });

        info!(dir = %directory.display(), port, "watch session started");
        *current = Some(handle);
        Ok(())
    }

    /// Terminate every tracked process.
    ///
    /// The set of sessions is snapshotted up front; terminations then run
    /// concurrently and this returns once all of them have finished.
    pub async fn stop(&self) {
        let slots = self.snapshot();

        let mut terminations = JoinSet::new();
        for (dir, slot) in slots {
            terminations.spawn(async move {
                let mut current = slot.lock().await;
                if let Some(mut handle) = current.take() {
                    let outcome = handle.terminate().await;
                    info!(dir = %dir.display(), ?outcome, "watch session stopped");
                }
            });
        }

        while let Some(joined) = terminations.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "terminating a watch session failed");
            }
        }
    }

    /// Directories that currently have a session.
    ///
    /// A session is dropped once its process has exited and its listener is
    /// closed.
    pub async fn running_directories(&self) -> Vec<PathBuf> {
        let slots = self.snapshot();

        let mut running = Vec::new();
        for (dir, slot) in slots {
            if slot.lock().await.is_some() {
                running.push(dir);
            }
        }
        running.sort();
        running
    }

    fn snapshot(&self) -> Vec<(PathBuf, Slot)> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(dir, slot)| (dir.clone(), Arc::clone(slot)))
            .collect()
    }

    fn slot_for(&self, directory: &Path) -> Slot {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(sessions.entry(directory.to_path_buf()).or_default())
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use teststream::errors::{Result, TeststreamError};
use teststream::exec::{ProcessHandle, ProcessOutcome, ProcessSpawner, process_channel};

/// Something that happened to a fake process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnEvent {
    Spawned { id: u32, dir: PathBuf, command: String },
    TerminateRequested { id: u32 },
    Exited { id: u32 },
}

#[derive(Default)]
struct Inner {
    events: Mutex<Vec<SpawnEvent>>,
    natural_exits: Mutex<HashMap<u32, oneshot::Sender<()>>>,
    next_id: AtomicUsize,
    live: AtomicUsize,
    fail_spawns: AtomicBool,
}

/// A fake spawner that:
/// - records every spawn, termination request and exit
/// - keeps each "process" alive until it is terminated or `exit` is called
/// - optionally takes `termination_delay` to shut down.
#[derive(Clone, Default)]
pub struct FakeSpawner {
    inner: Arc<Inner>,
    termination_delay: Duration,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_termination_delay(mut self, delay: Duration) -> Self {
        self.termination_delay = delay;
        self
    }

    /// Make every following spawn fail.
    pub fn fail_spawns(&self, fail: bool) {
        self.inner.fail_spawns.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<SpawnEvent> {
        self.inner.events.lock().unwrap().clone()
    }

    /// Commands passed to `spawn`, in order.
    pub fn commands(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SpawnEvent::Spawned { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }

    /// Let process `id` exit on its own with code 0.
    pub fn exit(&self, id: u32) {
        if let Some(tx) = self.inner.natural_exits.lock().unwrap().remove(&id) {
            let _ = tx.send(());
        }
    }

    fn record(inner: &Inner, event: SpawnEvent) {
        inner.events.lock().unwrap().push(event);
    }
}

impl ProcessSpawner for FakeSpawner {
    fn spawn(&self, command: &str, directory: &Path) -> Result<ProcessHandle> {
        if self.inner.fail_spawns.load(Ordering::SeqCst) {
            return Err(TeststreamError::Spawn {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "fake spawn failure"),
            });
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) as u32 + 1;
        Self::record(
            &self.inner,
            SpawnEvent::Spawned {
                id,
                dir: directory.to_path_buf(),
                command: command.to_string(),
            },
        );
        self.inner.live.fetch_add(1, Ordering::SeqCst);

        let (exit_tx, exit_rx) = oneshot::channel();
        self.inner.natural_exits.lock().unwrap().insert(id, exit_tx);

        let (handle, mut control) = process_channel(command, Some(id));
        let inner = Arc::clone(&self.inner);
        let delay = self.termination_delay;

        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = control.terminate_requested() => {
                    FakeSpawner::record(&inner, SpawnEvent::TerminateRequested { id });
                    tokio::time::sleep(delay).await;
                    ProcessOutcome::Terminated
                }
                _ = exit_rx => ProcessOutcome::Exited(0),
            };

            inner.live.fetch_sub(1, Ordering::SeqCst);
            FakeSpawner::record(&inner, SpawnEvent::Exited { id });
            control.report_exit(outcome);
        });

        Ok(handle)
    }
}

// src/session/observer.rs

use tracing::{info, warn};

use crate::protocol::{ResultMessage, TestOutcome};

/// Receives the classified content of every batch from every session.
///
/// Batches from different connections may be delivered concurrently.
pub trait WatchObserver: Send + Sync {
    fn on_start(&self);

    /// Called only for batches containing at least one result.
    fn on_result(&self, results: Vec<ResultMessage>);

    fn on_end(&self);

    fn on_discovery(&self, _discovered: Vec<String>) {}
}

/// Observer used by the CLI: reports everything through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl WatchObserver for LoggingObserver {
    fn on_start(&self) {
        info!("test run started");
    }

    fn on_result(&self, results: Vec<ResultMessage>) {
        for result in results {
            match result.outcome {
                TestOutcome::Failed => warn!(
                    test = %result.full_name,
                    message = result.message.as_deref().unwrap_or(""),
                    "test failed"
                ),
                outcome => info!(test = %result.full_name, ?outcome, "test result"),
            }
        }
    }

    fn on_end(&self) {
        info!("test run complete");
    }

    fn on_discovery(&self, discovered: Vec<String>) {
        info!(count = discovered.len(), "tests discovered");
    }
}

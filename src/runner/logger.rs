// src/runner/logger.rs

use std::collections::HashMap;

use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::protocol::{Message, ResultMessage, TestCase, TestOutcome};
use crate::runner::config::LoggerConfig;
use crate::runner::queue::{QueueProducer, batching_queue};
use crate::runner::sender::SenderLoop;
use crate::runner::signal::{RunEndedTrigger, run_ended};

/// Result of one test case as handed over by the test framework.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub test_case: TestCase,
    pub outcome: TestOutcome,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_stack_trace: Option<String>,
}

impl TestCaseResult {
    pub fn new(test_case: TestCase, outcome: TestOutcome) -> Self {
        Self {
            test_case,
            outcome,
            error_message: None,
            error_stack_trace: None,
        }
    }

    fn to_message(&self) -> Message {
        Message::Result(ResultMessage {
            full_name: self.test_case.identity().to_string(),
            outcome: self.outcome,
            message: self.error_message.clone(),
            stack_trace: self.error_stack_trace.clone(),
        })
    }
}

/// Runner-side entry point for test framework callbacks.
///
/// The `on_*` callbacks only enqueue and may be called from any thread,
/// with or without a Tokio runtime. Delivery happens on a background
/// [`SenderLoop`] started by [`RunnerLogger::start`], which must be called
/// from inside a Tokio runtime.
///
/// A logger serves exactly one run: after [`RunnerLogger::flush`] (or one of
/// the completion callbacks) the sender loop has terminated and further
/// messages are not delivered.
pub struct RunnerLogger {
    config: LoggerConfig,
    queue: QueueProducer<Message>,
    run_ended: RunEndedTrigger,
    sender: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for RunnerLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerLogger")
            .field("config", &self.config)
            .field("run_ended", &self.run_ended.is_settled())
            .finish_non_exhaustive()
    }
}

impl RunnerLogger {
    /// Initialise from logger parameters; fails if `port` is missing or
    /// invalid.
    pub fn initialize(params: &HashMap<String, String>) -> Result<Self> {
        let config = LoggerConfig::from_parameters(params)?;
        Ok(Self::start(config))
    }

    /// Start the sender loop for an already-parsed config.
    pub fn start(config: LoggerConfig) -> Self {
        let (queue, consumer) = batching_queue();
        let (trigger, signal) = run_ended();

        let sender = SenderLoop::new(consumer, signal, config.clone()).spawn();

        info!(host = %config.host, port = config.port, "runner logger initialized");

        Self {
            config,
            queue,
            run_ended: trigger,
            sender: Mutex::new(Some(sender)),
        }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn on_test_run_start(&self) {
        self.queue.push(Message::RunStarted);
    }

    pub fn on_discovered_tests(&self, test_cases: &[TestCase]) {
        let discovered = test_cases
            .iter()
            .map(|tc| tc.identity().to_string())
            .collect();
        self.queue.push(Message::Discovery { discovered });
    }

    pub fn on_test_result(&self, result: &TestCaseResult) {
        self.queue.push(result.to_message());
    }

    /// Enqueue the run-complete marker and flush.
    pub async fn on_test_run_complete(&self) {
        self.queue.push(Message::RunComplete);
        self.flush().await;
    }

    pub async fn on_discovery_complete(&self) {
        self.flush().await;
    }

    /// Settle the run-ended signal and wait for the sender loop to finish its
    /// final drain.
    ///
    /// Every message enqueued before this call is part of the final drain.
    /// Concurrent callers all wait for the same sender loop.
    pub async fn flush(&self) {
        if self.run_ended.settle() {
            debug!("run ended; flushing queued messages");
        }

        let mut sender = self.sender.lock().await;
        if let Some(handle) = sender.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "sender loop did not finish cleanly");
            }
        }
    }
}

impl Drop for RunnerLogger {
    fn drop(&mut self) {
        self.run_ended.settle();
    }
}

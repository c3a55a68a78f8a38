// src/runner/mod.rs

//! Runner-side event producer.
//!
//! Lives inside the (short-lived) test runner process:
//!
//! - [`logger`] is the surface the test framework calls into.
//! - [`queue`] is the thread-safe FIFO between those callbacks and the
//!   sender.
//! - [`sender`] is the background loop that debounces, batches, and sends.
//! - [`signal`] is the settle-once run-ended signal that ends the loop.
//! - [`config`] parses the logger parameters (`port`, ...).

pub mod config;
pub mod logger;
pub mod queue;
pub mod sender;
pub mod signal;

pub use config::{LoggerConfig, logger_arg, parse_logger_arg};
pub use logger::{RunnerLogger, TestCaseResult};
pub use queue::{QueueConsumer, QueueProducer, batching_queue};
pub use sender::{SenderLoop, SenderState, transmit};
pub use signal::{RunEndedSignal, RunEndedTrigger, run_ended};

// src/exec/mod.rs

//! Process execution layer.
//!
//! Starts the external test runner for a watched directory and gives the
//! session orchestrator a handle to await or terminate it.
//!
//! - [`process`] defines the `ProcessHandle` / `ProcessControl` pair.
//! - [`task_runner`] supervises a real child process.
//! - [`backend`] provides the `ProcessSpawner` trait and the production
//!   `ShellProcessSpawner`; tests replace it with a fake implementation.

pub mod backend;
pub mod process;
pub mod task_runner;

pub use backend::{DEFAULT_TERMINATE_GRACE, ProcessSpawner, ShellProcessSpawner};
pub use process::{ExitWatcher, ProcessControl, ProcessHandle, ProcessOutcome, process_channel};

// src/session/mod.rs

//! Watch sessions: one results listener plus one test runner process per
//! watched directory.
//!
//! - [`orchestrator`] owns the directory → process map and enforces at most
//!   one live process per directory.
//! - [`classify`] turns a decoded batch into start / result / end signals.
//! - [`observer`] is the callback surface for whoever renders results.
//! - [`directories`] supplies the directories to watch.
//! - [`command`] renders the test runner command for a listener port.

pub mod classify;
pub mod command;
pub mod directories;
pub mod observer;
pub mod orchestrator;

pub use classify::{BatchSignals, classify_batch};
pub use command::CommandTemplate;
pub use directories::{StaticTestDirectories, TestDirectories};
pub use observer::{LoggingObserver, WatchObserver};
pub use orchestrator::WatchOrchestrator;

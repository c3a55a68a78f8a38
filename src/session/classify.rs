// src/session/classify.rs

use crate::protocol::{Message, ResultMessage};
use crate::session::observer::WatchObserver;

/// What a single batch means for the observer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSignals {
    pub started: bool,
    pub discovered: Vec<String>,
    pub results: Vec<ResultMessage>,
    pub ended: bool,
}

impl BatchSignals {
    /// Forward to the observer: start, discovery, results, end.
    ///
    /// Callbacks with nothing to report are skipped.
    pub fn dispatch(self, observer: &dyn WatchObserver) {
        if self.started {
            observer.on_start();
        }
        if !self.discovered.is_empty() {
            observer.on_discovery(self.discovered);
        }
        if !self.results.is_empty() {
            observer.on_result(self.results);
        }
        if self.ended {
            observer.on_end();
        }
    }
}

/// Split a decoded batch into start / discovery / result / end signals.
///
/// Results keep their order within the batch. Discovery lists from several
/// messages are concatenated.
pub fn classify_batch(messages: Vec<Message>) -> BatchSignals {
    let mut signals = BatchSignals::default();

    for message in messages {
        match message {
            Message::RunStarted => signals.started = true,
            Message::Discovery { discovered } => signals.discovered.extend(discovered),
            Message::Result(result) => signals.results.push(result),
            Message::RunComplete => signals.ended = true,
        }
    }

    signals
}

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use teststream::protocol::ResultMessage;
use teststream::session::WatchObserver;

/// One observer callback, as recorded by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Started,
    Discovered(Vec<String>),
    Results(Vec<ResultMessage>),
    Ended,
}

/// Observer that forwards every callback into a channel.
pub struct RecordingObserver {
    tx: mpsc::UnboundedSender<Observed>,
}

impl RecordingObserver {
    pub fn new() -> (Arc<Self>, ObservedStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), ObservedStream { rx })
    }
}

impl WatchObserver for RecordingObserver {
    fn on_start(&self) {
        let _ = self.tx.send(Observed::Started);
    }

    fn on_result(&self, results: Vec<ResultMessage>) {
        let _ = self.tx.send(Observed::Results(results));
    }

    fn on_end(&self) {
        let _ = self.tx.send(Observed::Ended);
    }

    fn on_discovery(&self, discovered: Vec<String>) {
        let _ = self.tx.send(Observed::Discovered(discovered));
    }
}

pub struct ObservedStream {
    rx: mpsc::UnboundedReceiver<Observed>,
}

impl ObservedStream {
    /// Next callback, or `None` if nothing arrives within `wait`.
    pub async fn next_within(&mut self, wait: Duration) -> Option<Observed> {
        tokio::time::timeout(wait, self.rx.recv()).await.ok().flatten()
    }

    /// Collect exactly `n` callbacks, panicking if they don't arrive in 5s.
    pub async fn take(&mut self, n: usize) -> Vec<Observed> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            match self.next_within(Duration::from_secs(5)).await {
                Some(event) => out.push(event),
                None => panic!("expected {n} observer callbacks, got {out:?}"),
            }
        }
        out
    }
}

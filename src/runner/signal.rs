// src/runner/signal.rs

use tokio::sync::watch;

/// Create a run-ended signal pair.
pub fn run_ended() -> (RunEndedTrigger, RunEndedSignal) {
    let (tx, rx) = watch::channel(false);
    (RunEndedTrigger { tx }, RunEndedSignal { rx })
}

/// Settles the run-ended signal. Settling more than once is a no-op.
#[derive(Debug)]
pub struct RunEndedTrigger {
    tx: watch::Sender<bool>,
}

impl RunEndedTrigger {
    /// Settle the signal. Returns `true` if this call was the one that
    /// settled it.
    pub fn settle(&self) -> bool {
        self.tx.send_if_modified(|settled| {
            if *settled {
                false
            } else {
                *settled = true;
                true
            }
        })
    }

    pub fn is_settled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observer side of the run-ended signal.
#[derive(Debug, Clone)]
pub struct RunEndedSignal {
    rx: watch::Receiver<bool>,
}

impl RunEndedSignal {
    pub fn is_settled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the signal has settled.
    ///
    /// A dropped trigger counts as settled: nobody is left to end the run.
    pub async fn settled(&mut self) {
        let _ = self.rx.wait_for(|settled| *settled).await;
    }
}

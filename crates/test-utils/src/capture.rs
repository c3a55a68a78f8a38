use std::time::Duration;

use tokio::sync::mpsc;
use teststream::listener::ResultsListener;
use teststream::protocol::Batch;

/// A results listener whose batches are collected into a channel.
pub struct BatchCapture {
    listener: ResultsListener,
    rx: mpsc::UnboundedReceiver<Batch>,
}

impl BatchCapture {
    pub async fn start() -> Self {
        let mut listener = ResultsListener::bind().await.expect("bind listener");
        let (tx, rx) = mpsc::unbounded_channel();
        listener
            .on_messages(move |batch| {
                let _ = tx.send(batch);
            })
            .expect("register callback");
        Self { listener, rx }
    }

    pub fn port(&self) -> u16 {
        self.listener.port()
    }

    pub fn listener_mut(&mut self) -> &mut ResultsListener {
        &mut self.listener
    }

    /// Next batch, panicking if none arrives within 5s.
    pub async fn next_batch(&mut self) -> Batch {
        self.next_batch_within(Duration::from_secs(5))
            .await
            .expect("no batch received within 5 seconds")
    }

    pub async fn next_batch_within(&mut self, wait: Duration) -> Option<Batch> {
        tokio::time::timeout(wait, self.rx.recv()).await.ok().flatten()
    }
}

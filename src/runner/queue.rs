// src/runner/queue.rs

//! Unbounded FIFO handoff between framework callbacks and the sender loop.

use tokio::sync::mpsc;
use tracing::trace;

/// Create a connected producer/consumer pair.
pub fn batching_queue<T>() -> (QueueProducer<T>, QueueConsumer<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueProducer { tx }, QueueConsumer { rx })
}

/// Producer side of the queue.
///
/// Cheap to clone and safe to share across threads. Items pushed from one
/// thread are received in the order they were pushed; there is no ordering
/// guarantee across threads.
#[derive(Debug)]
pub struct QueueProducer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for QueueProducer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> QueueProducer<T> {
    /// Enqueue an item. Never blocks.
    ///
    /// Once the consumer is gone there is nobody left to deliver to, so the
    /// item is dropped.
    pub fn push(&self, item: T) {
        if self.tx.send(item).is_err() {
            trace!("queue consumer dropped; discarding pushed item");
        }
    }
}

/// Consumer side of the queue. There is exactly one.
#[derive(Debug)]
pub struct QueueConsumer<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> QueueConsumer<T> {
    /// Wait for the next item.
    ///
    /// Returns `None` once every producer has been dropped and the queue is
    /// empty. Cancel-safe: dropping the future never loses an item.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Remove and return everything currently queued, in FIFO order.
    pub fn drain_available(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.rx.len());
        while let Ok(item) = self.rx.try_recv() {
            items.push(item);
        }
        items
    }
}

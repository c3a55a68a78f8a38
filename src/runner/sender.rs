// src/runner/sender.rs

//! Background task that turns queued messages into batches on the wire.
//!
//! One cycle of the loop:
//!
//! - `Idle`: wait for either the first message or the run-ended signal.
//! - `CollectingFirst` / `Debouncing`: a message arrived; wait for the
//!   debounce window so that a burst of results ends up in one connection,
//!   then drain the queue and send.
//! - `Draining`: the run ended; drain whatever is queued, send it, and stop.
//!
//! Run-ended always wins a tie with a queued message, and it also cuts a
//! running debounce window short, so the final flush never pays the debounce
//! delay.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::protocol::{Batch, Message, encode_batch};
use crate::runner::config::LoggerConfig;
use crate::runner::queue::QueueConsumer;
use crate::runner::signal::RunEndedSignal;

/// Upper bound for connecting to the host and writing one batch.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Idle,
    CollectingFirst,
    Debouncing,
    Draining,
    Terminated,
}

/// What a single collection cycle produced.
enum Cycle {
    /// Send this batch and go back to `Idle`.
    Send(Batch),
    /// Send this batch (if non-empty) and terminate.
    Final(Batch),
}

pub struct SenderLoop {
    queue: QueueConsumer<Message>,
    run_ended: RunEndedSignal,
    config: LoggerConfig,
    state: SenderState,
}

impl std::fmt::Debug for SenderLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderLoop")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SenderLoop {
    pub fn new(
        queue: QueueConsumer<Message>,
        run_ended: RunEndedSignal,
        config: LoggerConfig,
    ) -> Self {
        Self {
            queue,
            run_ended,
            config,
            state: SenderState::Idle,
        }
    }

    /// Run the loop on the current Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Main loop. Returns after the final drain.
    pub async fn run(mut self) {
        info!(
            host = %self.config.host,
            port = self.config.port,
            debounce_ms = self.config.debounce.as_millis() as u64,
            "sender loop started"
        );

        loop {
            match self.collect().await {
                Cycle::Send(batch) => self.send_batch(batch).await,
                Cycle::Final(batch) => {
                    if !batch.is_empty() {
                        self.send_batch(batch).await;
                    }
                    break;
                }
            }
        }

        self.transition(SenderState::Terminated);
        info!("sender loop finished");
    }

    async fn collect(&mut self) -> Cycle {
        self.transition(SenderState::Idle);

        let first = tokio::select! {
            biased;
            _ = self.run_ended.settled() => None,
            item = self.queue.recv() => item,
        };

        let Some(first) = first else {
            // Run ended, or every producer is gone and nothing is left.
            self.transition(SenderState::Draining);
            return Cycle::Final(self.queue.drain_available());
        };

        self.transition(SenderState::CollectingFirst);
        let mut batch = vec![first];

        self.transition(SenderState::Debouncing);
        let ended = tokio::select! {
            biased;
            _ = self.run_ended.settled() => true,
            _ = tokio::time::sleep(self.config.debounce) => false,
        };

        batch.extend(self.queue.drain_available());

        if ended {
            self.transition(SenderState::Draining);
            Cycle::Final(batch)
        } else {
            Cycle::Send(batch)
        }
    }

    async fn send_batch(&self, batch: Batch) {
        let count = batch.len();
        debug!(count, "sending batch");

        match transmit(&self.config.host, self.config.port, &batch).await {
            Ok(()) => debug!(count, "batch sent"),
            Err(err) => warn!(
                count,
                error = %format!("{err:#}"),
                "sending batch failed; discarding it"
            ),
        }
    }

    fn transition(&mut self, next: SenderState) {
        trace!(from = ?self.state, to = ?next, "sender state transition");
        self.state = next;
    }
}

/// Open a fresh connection, write the batch as one JSON array, and close.
///
/// End-of-stream is the only delimiter the host relies on, so the write half
/// is shut down explicitly before the stream is dropped.
pub async fn transmit(host: &str, port: u16, batch: &[Message]) -> Result<()> {
    let payload = encode_batch(batch).context("encoding batch")?;

    let send = async {
        let mut stream = TcpStream::connect((host, port))
            .await
            .with_context(|| format!("connecting to {host}:{port}"))?;
        stream
            .write_all(&payload)
            .await
            .context("writing batch payload")?;
        stream.shutdown().await.context("closing connection")?;
        Ok::<(), anyhow::Error>(())
    };

    tokio::time::timeout(SEND_TIMEOUT, send)
        .await
        .with_context(|| format!("sending batch to {host}:{port} timed out"))?
}

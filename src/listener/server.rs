// src/listener/server.rs

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{Result, TeststreamError};
use crate::protocol::{Batch, decode_batch};

/// Largest payload accepted on a single connection.
pub const MAX_BATCH_BYTES: u64 = 16 * 1024 * 1024;

/// How long a peer may take to send its batch and close.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// How long after shutdown connections still queued in the backlog are
/// picked up.
const BACKLOG_DRAIN: Duration = Duration::from_millis(50);

/// Callback receiving the decoded batch of one connection.
///
/// Connections are handled concurrently, so the callback may run on several
/// tasks at once.
pub type MessagesCallback = Arc<dyn Fn(Batch) + Send + Sync>;

/// Host-side loopback listener for one watch session.
///
/// Lifecycle:
/// 1. [`ResultsListener::bind`] reserves an OS-assigned port.
/// 2. [`ResultsListener::on_messages`] registers the single callback and
///    starts accepting. Connections made before that wait in the backlog.
/// 3. [`ResultsListener::dispose`] (or drop) stops accepting and releases
///    the port. Connections already accepted or waiting in the backlog are
///    still read and delivered.
pub struct ResultsListener {
    port: u16,
    listener: Option<TcpListener>,
    shutdown: Option<oneshot::Sender<()>>,
    accept_task: Option<JoinHandle<()>>,
    disposed: bool,
}

impl std::fmt::Debug for ResultsListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultsListener")
            .field("port", &self.port)
            .field("accepting", &self.accept_task.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl ResultsListener {
    /// Bind to an OS-assigned port on `127.0.0.1`.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(TeststreamError::Bind)?;
        let port = listener.local_addr().map_err(TeststreamError::Bind)?.port();

        info!(port, "results listener bound");

        Ok(Self {
            port,
            listener: Some(listener),
            shutdown: None,
            accept_task: None,
            disposed: false,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Register the callback and start the accept loop.
    ///
    /// Only one callback may ever be registered.
    pub fn on_messages<F>(&mut self, callback: F) -> Result<()>
    where
        F: Fn(Batch) + Send + Sync + 'static,
    {
        if self.disposed {
            return Err(TeststreamError::Listener(format!(
                "listener on port {} is disposed",
                self.port
            )));
        }

        let listener = self.listener.take().ok_or_else(|| {
            TeststreamError::Listener(format!(
                "a callback is already registered on port {}",
                self.port
            ))
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let callback: MessagesCallback = Arc::new(callback);
        let port = self.port;

        self.shutdown = Some(shutdown_tx);
        self.accept_task = Some(tokio::spawn(accept_loop(
            listener,
            callback,
            shutdown_rx,
            port,
        )));

        Ok(())
    }

    /// Stop accepting and release the port. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        // Never started accepting: dropping the socket releases the port.
        self.listener.take();

        if let Some(shutdown) = self.shutdown.take() {
            // The loop may already be gone; either way it is stopping.
            let _ = shutdown.send(());
        }

        info!(port = self.port, "results listener disposed");
    }

    /// Dispose and wait until the accept loop (and with it the socket) is
    /// gone.
    pub async fn close(mut self) {
        self.dispose();
        if let Some(task) = self.accept_task.take() {
            if let Err(err) = task.await {
                warn!(port = self.port, error = %err, "accept loop ended abnormally");
            }
        }
    }
}

impl Drop for ResultsListener {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn accept_loop(
    listener: TcpListener,
    callback: MessagesCallback,
    mut shutdown: oneshot::Receiver<()>,
    port: u16,
) {
    debug!(port, "accept loop started");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!(port, "accept loop stopping");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let callback = Arc::clone(&callback);
                    tokio::spawn(handle_connection(stream, peer, callback, port));
                }
                Err(err) => {
                    warn!(port, error = %err, "failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    // A runner that sent its last batch and exited may still sit in the
    // backlog.
    let deadline = tokio::time::Instant::now() + BACKLOG_DRAIN;
    while let Ok(Ok((stream, peer))) = tokio::time::timeout_at(deadline, listener.accept()).await {
        debug!(port, %peer, "accepted queued connection during shutdown");
        tokio::spawn(handle_connection(stream, peer, Arc::clone(&callback), port));
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    callback: MessagesCallback,
    port: u16,
) {
    match read_batch(stream).await {
        Ok(Some(batch)) if !batch.is_empty() => {
            debug!(port, %peer, count = batch.len(), "received batch");
            callback(batch);
        }
        Ok(_) => debug!(port, %peer, "connection carried no messages"),
        Err(err) => warn!(
            port,
            %peer,
            error = %format!("{err:#}"),
            "dropping batch from connection"
        ),
    }
}

/// Read one connection to end-of-stream and decode its payload.
async fn read_batch(stream: TcpStream) -> anyhow::Result<Option<Batch>> {
    let mut bytes = Vec::new();
    let mut limited = stream.take(MAX_BATCH_BYTES + 1);

    tokio::time::timeout(READ_TIMEOUT, limited.read_to_end(&mut bytes))
        .await
        .context("peer did not close the connection in time")?
        .context("reading connection")?;

    if bytes.len() as u64 > MAX_BATCH_BYTES {
        bail!("payload exceeds {MAX_BATCH_BYTES} bytes");
    }
    if bytes.is_empty() {
        return Ok(None);
    }

    let batch = decode_batch(&bytes).context("decoding batch")?;
    Ok(Some(batch))
}

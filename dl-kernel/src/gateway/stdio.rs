//! Line-delimited JSON transport over the kernel's standard streams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dl_kernel_common::{HostMessage, KernelMessage};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::Transmit;
use crate::error::TransmitError;

type PendingMap = HashMap<String, oneshot::Sender<HostMessage>>;

/// A complete line queued for the writer task.
struct OutboundLine {
    line: String,
    written: oneshot::Sender<std::io::Result<()>>,
}

/// Transport writing kernel messages as JSON lines and matching host
/// replies to outstanding data requests by request id.
///
/// Lines are written by a dedicated task, so a caller that gives up while
/// its line is queued or being written never leaves half a line behind.
pub struct StdioTransport {
    outbound: mpsc::Sender<OutboundLine>,
    pending: Arc<StdMutex<PendingMap>>,
    closed: Arc<AtomicBool>,
}

impl StdioTransport {
    /// Must be called from within a tokio runtime.
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (outbound, rx) = mpsc::channel(32);
        tokio::spawn(write_loop(writer, rx));

        Self {
            outbound,
            pending: Arc::new(StdMutex::new(HashMap::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Transport writing to the process's stdout.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }

    /// Start reading host messages from `reader`.
    ///
    /// Replies to data requests are handed to the waiting requester. All
    /// other host messages are forwarded to `commands`. When the input ends,
    /// outstanding requests fail and new ones are refused.
    pub fn spawn_reader<R>(&self, reader: R, commands: mpsc::Sender<HostMessage>) -> JoinHandle<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let pending = self.pending.clone();
        let closed = self.closed.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let message: HostMessage = match serde_json::from_str(&line) {
                            Ok(message) => message,
                            Err(e) => {
                                tracing::warn!("Skipping malformed host message: {}", e);
                                continue;
                            }
                        };

                        if message.is_data_reply() {
                            route_reply(&pending, message);
                        } else if commands.send(message).await.is_err() {
                            tracing::debug!("Command receiver dropped, stopping host reader");
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!("Host closed the input stream");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("Error reading from host: {}", e);
                        break;
                    }
                }
            }

            closed.store(true, Ordering::SeqCst);
            // Dropping the senders wakes every waiting requester with an error
            lock_pending(&pending).clear();
        })
    }

    /// Whether the host input has ended.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of data requests waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        lock_pending(&self.pending).len()
    }

    async fn write_message(&self, message: &KernelMessage) -> Result<(), TransmitError> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let (written, done) = oneshot::channel();
        self.outbound
            .send(OutboundLine { line, written })
            .await
            .map_err(|_| TransmitError::from("host output closed"))?;
        done.await
            .map_err(|_| TransmitError::from("host output closed"))??;
        Ok(())
    }
}

/// Write queued lines in order until the transport is dropped or a write fails.
async fn write_loop<W>(mut writer: W, mut rx: mpsc::Receiver<OutboundLine>)
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    while let Some(OutboundLine { line, written }) = rx.recv().await {
        let result = match writer.write_all(line.as_bytes()).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        let failed = result.is_err();
        if let Err(ref e) = result {
            tracing::error!("Error writing to host: {}", e);
        }
        // The sender may have stopped waiting; the line is out either way
        let _ = written.send(result);
        if failed {
            break;
        }
    }
}

#[async_trait]
impl Transmit for StdioTransport {
    async fn transmit(&self, message: KernelMessage) -> Result<Option<HostMessage>, TransmitError> {
        let request_id = match &message {
            KernelMessage::DataRequest { request_id, .. } => request_id.clone(),
            _ => {
                self.write_message(&message).await?;
                return Ok(None);
            }
        };

        let (tx, rx) = oneshot::channel();
        lock_pending(&self.pending).insert(request_id.clone(), tx);
        let _pending = PendingGuard {
            pending: &self.pending,
            request_id: &request_id,
        };

        if self.is_closed() {
            return Err("host connection closed".into());
        }

        self.write_message(&message).await?;
        tracing::debug!("Sent data request {} to host", request_id);

        match rx.await {
            Ok(reply) => Ok(Some(reply)),
            Err(_) => Err(format!("host connection closed before reply to {}", request_id).into()),
        }
    }
}

/// Removes a pending request however its requester exits.
struct PendingGuard<'a> {
    pending: &'a StdMutex<PendingMap>,
    request_id: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove(self.request_id);
    }
}

fn lock_pending(pending: &StdMutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn route_reply(pending: &StdMutex<PendingMap>, message: HostMessage) {
    let request_id = match &message {
        HostMessage::DataResponse { request_id, .. } | HostMessage::DataError { request_id, .. } => {
            request_id.clone()
        }
        _ => return,
    };

    let waiting = lock_pending(pending).remove(&request_id);
    match waiting {
        Some(tx) => {
            if tx.send(message).is_err() {
                tracing::debug!("Requester for {} gave up before the reply", request_id);
            }
        }
        None => {
            tracing::warn!("Dropping reply to unknown data request {}", request_id);
        }
    }
}

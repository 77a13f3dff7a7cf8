//! Host gateway: the single path for kernel messages to the host.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dl_kernel_common::{HostMessage, KernelMessage};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::Workspace;
use crate::error::{Error, Result, TransmitError};

/// Sends one message to the host.
///
/// For data requests the implementation waits for and returns the host's
/// reply. For any other message it returns once the message is written.
///
/// The returned future may be dropped at any await point (the gateway does so
/// on timeout); implementations must not leave a partial message behind.
#[async_trait]
pub trait Transmit: Send + Sync {
    async fn transmit(
        &self,
        message: KernelMessage,
    ) -> std::result::Result<Option<HostMessage>, TransmitError>;
}

/// Bridge between kernel code and the host process.
///
/// Holds the shared workspace and the transport. Data requests are sent one
/// at a time since the host answers at most one outstanding request per
/// kernel; every other message goes straight to the transport.
pub struct HostGateway {
    workspace: Arc<Workspace>,
    transmit: Arc<dyn Transmit>,
    send_lock: Mutex<()>,
    request_timeout: Option<Duration>,
}

impl HostGateway {
    pub fn new(workspace: Arc<Workspace>, transmit: Arc<dyn Transmit>) -> Self {
        Self {
            workspace,
            transmit,
            send_lock: Mutex::new(()),
            request_timeout: None,
        }
    }

    /// Bound the wait of `request` calls. `None` waits indefinitely.
    pub fn with_request_timeout(mut self, request_timeout: Option<Duration>) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Send a message to the host.
    ///
    /// Data requests hold the send lock until the transport returns, on
    /// success and on failure. Transport errors are returned unchanged.
    pub async fn send_to_host(
        &self,
        message: KernelMessage,
    ) -> std::result::Result<Option<HostMessage>, TransmitError> {
        if message.is_data_request() {
            let _guard = self.send_lock.lock().await;
            self.transmit.transmit(message).await
        } else {
            self.transmit.transmit(message).await
        }
    }

    /// Like `send_to_host`, but gives up after `limit`.
    ///
    /// The limit covers waiting for the send lock as well as the transport.
    /// On expiry the in-flight send is dropped and the lock released.
    pub async fn send_to_host_with_timeout(
        &self,
        message: KernelMessage,
        limit: Duration,
    ) -> Result<Option<HostMessage>> {
        match tokio::time::timeout(limit, self.send_to_host(message)).await {
            Ok(result) => result.map_err(Error::Transmit),
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Ask the host for data on `topic` and wait for the answer payload.
    pub async fn request(
        &self,
        topic: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let request_id = Uuid::new_v4().to_string();
        let message = KernelMessage::DataRequest {
            request_id: request_id.clone(),
            topic: topic.into(),
            payload,
        };

        let reply = match self.request_timeout {
            Some(limit) => self.send_to_host_with_timeout(message, limit).await?,
            None => self.send_to_host(message).await.map_err(Error::Transmit)?,
        };

        match reply {
            Some(HostMessage::DataResponse {
                request_id: reply_id,
                payload,
            }) if reply_id == request_id => Ok(payload),
            Some(HostMessage::DataError {
                request_id: reply_id,
                message,
            }) if reply_id == request_id => Err(Error::HostRequest(message)),
            Some(other) => Err(Error::Protocol(format!(
                "Unexpected reply to data request {}: {:?}",
                request_id, other
            ))),
            None => Err(Error::Protocol(format!(
                "No reply to data request {}",
                request_id
            ))),
        }
    }

    /// Send a one-way notification on `topic`.
    pub async fn notify(&self, topic: impl Into<String>, payload: serde_json::Value) -> Result<()> {
        let message = KernelMessage::Notification {
            topic: topic.into(),
            payload,
        };
        // Whatever the transport returns for a notification is ignored
        self.send_to_host(message).await.map_err(Error::Transmit)?;
        Ok(())
    }
}

//! Line protocol types for kernel-host communication.
//!
//! The kernel runs as a child of the host process and talks to it over its
//! standard streams.
//!
//! # Protocol Overview
//!
//! Each message is a single line of JSON with a `type` field that determines
//! its structure.
//!
//! ## Message Flow
//!
//! 1. Kernel starts and sends `Ready` with the registered network types
//! 2. Host sends commands (`ListNetworkTypes`, `ResolveModelType`, `ReadNetwork`)
//! 3. Kernel answers each command with `Reply` or `Error`
//! 4. Kernel adapter code may send `DataRequest` and block until the host
//!    answers with `DataResponse` or `DataError`
//! 5. Host sends `Shutdown` (or closes stdin) to stop the kernel
//!
//! ## Data Requests
//!
//! The host side handles one outstanding data request per kernel at a time.
//! Every other kernel message is fire-and-forget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::NetworkSpec;

/// Current protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages sent from kernel to host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KernelMessage {
    /// Ask the host for data. The host must answer with `DataResponse` or `DataError`.
    DataRequest {
        request_id: String,
        topic: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// One-way notification.
    Notification {
        topic: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// Sent once after start-up.
    Ready {
        protocol_version: u32,
        kernel_version: String,
        started_at: DateTime<Utc>,
        network_types: Vec<NetworkTypeInfo>,
    },
    /// Successful answer to a host command.
    Reply { request_id: String, body: ReplyBody },
    /// Failed answer to a host command.
    Error {
        request_id: String,
        code: String,
        message: String,
    },
}

impl KernelMessage {
    /// Whether the host is expected to answer this message.
    pub fn is_data_request(&self) -> bool {
        matches!(self, KernelMessage::DataRequest { .. })
    }

    /// Request id this message carries, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            KernelMessage::DataRequest { request_id, .. }
            | KernelMessage::Reply { request_id, .. }
            | KernelMessage::Error { request_id, .. } => Some(request_id),
            KernelMessage::Notification { .. } | KernelMessage::Ready { .. } => None,
        }
    }
}

/// Messages sent from host to kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// Answer to a kernel `DataRequest`.
    DataResponse {
        request_id: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// Failed answer to a kernel `DataRequest`.
    DataError { request_id: String, message: String },
    /// List all registered network types.
    ListNetworkTypes { request_id: String },
    /// Find the network type owning a model of the given runtime type.
    ResolveModelType {
        request_id: String,
        type_name: String,
    },
    /// Read a network from disk with the reader of the given network type.
    ReadNetwork {
        request_id: String,
        network_type: String,
        path: String,
    },
    /// Stop the kernel.
    Shutdown,
}

impl HostMessage {
    /// Whether this message answers a kernel `DataRequest`.
    pub fn is_data_reply(&self) -> bool {
        matches!(
            self,
            HostMessage::DataResponse { .. } | HostMessage::DataError { .. }
        )
    }
}

/// Body of a successful command reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyBody {
    NetworkTypes { network_types: Vec<NetworkTypeInfo> },
    Resolved { identifier: String },
    NetworkSpec { spec: NetworkSpec },
}

/// Public description of a registered network type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTypeInfo {
    /// Unique identifier (e.g., "keras")
    pub identifier: String,
    /// Runtime type name prefixes of models this type owns
    pub backend_module_names: Vec<String>,
}

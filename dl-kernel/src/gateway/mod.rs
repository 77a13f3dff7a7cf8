//! Host gateway for kernel-host communication.
//!
//! This module owns everything that talks to the host process: the gateway
//! that serializes data requests, the workspace shared with adapter code,
//! and the line-based transport over the kernel's standard streams.

mod host;
mod stdio;
mod workspace;

pub use host::{HostGateway, Transmit};
pub use stdio::StdioTransport;
pub use workspace::Workspace;

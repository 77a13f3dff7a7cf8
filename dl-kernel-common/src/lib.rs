//! DL Kernel Common Types
//!
//! Shared types used by the kernel process and anything speaking its host protocol.

pub mod protocol;
pub mod spec;

pub use protocol::{
    HostMessage, KernelMessage, NetworkTypeInfo, ReplyBody, PROTOCOL_VERSION,
};
pub use spec::{NetworkSpec, TensorSpec};

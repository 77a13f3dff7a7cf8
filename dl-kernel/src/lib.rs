//! DL Kernel - companion process that lets a host drive deep learning
//! network types.

pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod network_type;

pub use commands::run_command_loop;
pub use config::Config;
pub use context::KernelContext;
pub use error::{Error, Result, TransmitError};
pub use gateway::{HostGateway, StdioTransport, Transmit, Workspace};
pub use network_type::{
    DeclaredNetworkType, Network, NetworkReader, NetworkType, NetworkTypeRegistry, PrefixPolicy,
    RawModel,
};

//! Error types for the DL kernel.

/// Error type returned by a host transport.
///
/// The gateway hands these back to callers exactly as the transport produced them.
pub type TransmitError = Box<dyn std::error::Error + Send + Sync>;

/// Error types for kernel operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Network type '{0}' already exists")]
    DuplicateIdentifier(String),

    #[error("Unknown network type: {0}")]
    UnknownIdentifier(String),

    #[error("No deep learning network type associated with type '{0}'")]
    UnresolvedModelType(String),

    #[error("Prefix '{prefix}' of network type '{identifier}' overlaps with network type '{existing}'")]
    OverlappingPrefix {
        identifier: String,
        prefix: String,
        existing: String,
    },

    #[error("Failed to read network: {0}")]
    ReadFailed(String),

    #[error("Network spec unavailable: {0}")]
    SpecUnavailable(String),

    #[error("Host rejected request: {0}")]
    HostRequest(String),

    #[error("Timed out waiting for host")]
    Timeout,

    #[error("Transmit failed: {0}")]
    Transmit(#[source] TransmitError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wire code reported to the host in `error` replies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::DuplicateIdentifier(_) => "duplicate_identifier",
            Error::UnknownIdentifier(_) => "unknown_identifier",
            Error::UnresolvedModelType(_) => "unresolved_model_type",
            Error::OverlappingPrefix { .. } => "overlapping_prefix",
            Error::ReadFailed(_) => "read_failed",
            Error::SpecUnavailable(_) => "spec_unavailable",
            Error::HostRequest(_) => "host_request",
            Error::Timeout => "timeout",
            Error::Transmit(_) => "transmit_failed",
            Error::Protocol(_) => "protocol_error",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

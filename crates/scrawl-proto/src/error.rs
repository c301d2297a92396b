//! Error types for the scrawl protocol library.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A candidate frame failed to parse as a protocol message.
    ///
    /// The codec discards such candidates internally; this variant surfaces
    /// only when a caller parses a message directly via [`crate::Message`].
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] serde_json::Error),
}

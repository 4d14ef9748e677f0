//! Error types for the link crate.

use droid_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur while talking to a droid.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Encoding or decoding failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No response arrived before the deadline.
    #[error("timed out after {timeout_ms} ms waiting for response 0x{command_id:02X}")]
    TimedOut {
        /// Command id that was awaited.
        command_id: u8,
        /// Timeout that expired.
        timeout_ms: u64,
    },

    /// The transport is not connected.
    #[error("droid is not connected")]
    NotConnected,

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;

impl LinkError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        LinkError::Transport(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        LinkError::Config(message.into())
    }

    /// Check if this error is a response timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LinkError::TimedOut { .. })
    }
}

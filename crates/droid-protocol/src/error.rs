//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding or decoding droid frames and beacons.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload bytes could not be produced from the supplied input.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Payload does not fit in a single command frame.
    #[error("payload too long: maximum {max} bytes, got {actual}")]
    PayloadTooLong {
        /// Maximum allowed payload length.
        max: usize,
        /// Actual payload length.
        actual: usize,
    },

    /// Received frame length disagrees with its declared size.
    #[error("truncated packet: declared {declared} bytes, received {actual}")]
    TruncatedPacket {
        /// Size declared by the frame header.
        declared: usize,
        /// Bytes actually received.
        actual: usize,
    },

    /// Script id outside the range allowed for the operation.
    #[error("invalid script id: {0}")]
    InvalidScriptId(i32),

    /// Script id that must never be executed.
    #[error("script {0} is dangerous, execution denied")]
    DangerousScript(u8),

    /// Factory script that must not be overwritten.
    #[error("script {0} is factory programmed and cannot be rewritten")]
    ReservedScript(u8),

    /// Motor direction not valid for the selected motor.
    #[error("invalid direction {direction} for motor {motor}")]
    InvalidDirection {
        /// Requested direction nibble.
        direction: u8,
        /// Motor identifier.
        motor: u8,
    },

    /// Affiliation that cannot be represented in an identity beacon.
    #[error("invalid affiliation id: {0}")]
    InvalidAffiliation(u8),

    /// Command identifier not known to this library.
    #[error("unknown command id: 0x{0:02X}")]
    UnknownCommand(u8),
}

impl ProtocolError {
    /// Create a malformed payload error.
    pub fn malformed(message: impl Into<String>) -> Self {
        ProtocolError::MalformedPayload(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::TruncatedPacket {
            declared: 7,
            actual: 8,
        };
        assert!(err.to_string().contains("declared 7"));

        let err = ProtocolError::UnknownCommand(0x2A);
        assert_eq!(err.to_string(), "unknown command id: 0x2A");

        let err = ProtocolError::malformed("odd length");
        assert!(err.to_string().contains("odd length"));
    }
}

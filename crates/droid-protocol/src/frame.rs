//! Frame encoding/decoding.
//!
//! Commands written to the droid use a four byte header:
//!
//! ```text
//! +--------------+-----------+-----+-------------+-------------------+
//! | (len+3)|0x20 | 0x42/0x00 | cmd | len + 0x40  | payload[0..len]   |
//! +--------------+-----------+-----+-------------+-------------------+
//! ```
//!
//! The second byte is `0x42` only for the multipurpose command (0x0F).
//!
//! Notifications coming back from the droid carry their own total size,
//! offset by 0x1F, in the first byte:
//!
//! ```text
//! +--------------+-----------+-----+-----------+-------------------+
//! | size + 0x1F  | reserved1 | cmd | reserved2 | payload           |
//! +--------------+-----------+-----+-----------+-------------------+
//! ```

use bytes::BufMut;

use crate::constants::*;
use crate::error::ProtocolError;

// ============================================================================
// Outbound
// ============================================================================

/// A command ready to be written to the command characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    /// Command identifier.
    pub command_id: u8,
    /// Payload bytes following the header.
    pub payload: Vec<u8>,
}

impl CommandFrame {
    /// Create a frame, rejecting payloads that do not fit the length byte.
    pub fn new(command_id: u8, payload: Vec<u8>) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_COMMAND_PAYLOAD {
            return Err(ProtocolError::PayloadTooLong {
                max: MAX_COMMAND_PAYLOAD,
                actual: payload.len(),
            });
        }
        Ok(CommandFrame {
            command_id,
            payload,
        })
    }

    /// A frame with no payload.
    pub fn empty(command_id: u8) -> Self {
        CommandFrame {
            command_id,
            payload: Vec::new(),
        }
    }

    /// Encode the frame to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        encode_command(self.command_id, &self.payload)
    }
}

/// Encode a command frame.
pub fn encode_command(command_id: u8, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let data_length = payload.len();
    if data_length > MAX_COMMAND_PAYLOAD {
        return Err(ProtocolError::PayloadTooLong {
            max: MAX_COMMAND_PAYLOAD,
            actual: data_length,
        });
    }

    let flag = if command_id == CMD_MULTIPURPOSE {
        MULTIPURPOSE_FRAME_FLAG
    } else {
        0x00
    };

    let mut buf = Vec::with_capacity(COMMAND_FRAME_OVERHEAD + data_length);
    buf.put_u8((data_length + COMMAND_HEADER_LENGTH) as u8 | COMMAND_FRAME_MARKER);
    buf.put_u8(flag);
    buf.put_u8(command_id);
    // Wraps for payloads of 192 bytes and more.
    buf.put_u8((data_length as u8).wrapping_add(PAYLOAD_LENGTH_MARKER));
    buf.extend_from_slice(payload);

    log::trace!("encoded command 0x{:02X}: {}", command_id, hex::encode(&buf));
    Ok(buf)
}

/// Encode a command whose payload is given as hex text.
pub fn encode_command_hex(command_id: u8, payload_hex: &str) -> Result<Vec<u8>, ProtocolError> {
    let payload = hex::decode(payload_hex).map_err(|e| {
        ProtocolError::malformed(format!(
            "failed to pack command 0x{:02X} with data {:?}: {}",
            command_id, payload_hex, e
        ))
    })?;
    encode_command(command_id, &payload)
}

/// Write `value` as two zero-padded decimal digits and read them back as one
/// hex byte, so 12 becomes 0x12.
///
/// Sub-command and script ids go on the wire this way. Every id in use is
/// below 10 apart from scripts 11 and 12, so whether the droid really expects
/// BCD or plain binary above 9 is unconfirmed.
pub fn decimal_digits_byte(value: u8) -> Result<u8, ProtocolError> {
    if value >= 100 {
        return Err(ProtocolError::malformed(format!(
            "{} does not fit in two decimal digits",
            value
        )));
    }
    Ok(((value / 10) << 4) | (value % 10))
}

/// Build a multipurpose command frame for `sub_command_id`.
pub fn encode_multipurpose(sub_command_id: u8, data: &[u8]) -> Result<CommandFrame, ProtocolError> {
    let mut payload = Vec::with_capacity(2 + data.len());
    payload.put_u8(MULTIPURPOSE_PAYLOAD_PREFIX);
    payload.put_u8(decimal_digits_byte(sub_command_id)?);
    payload.extend_from_slice(data);
    CommandFrame::new(CMD_MULTIPURPOSE, payload)
}

/// Header fields recovered from an encoded command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    /// Command identifier.
    pub command_id: u8,
    /// Number of payload bytes following the header.
    pub payload_length: usize,
    /// Whether the multipurpose flag byte was set.
    pub multipurpose: bool,
}

/// Parse the header of an encoded command frame.
pub fn decode_command_header(frame: &[u8]) -> Result<CommandHeader, ProtocolError> {
    if frame.len() < COMMAND_FRAME_OVERHEAD {
        return Err(ProtocolError::TruncatedPacket {
            declared: COMMAND_FRAME_OVERHEAD,
            actual: frame.len(),
        });
    }

    let payload_length = frame[3].wrapping_sub(PAYLOAD_LENGTH_MARKER) as usize;
    let expected_first = (payload_length + COMMAND_HEADER_LENGTH) as u8 | COMMAND_FRAME_MARKER;
    if frame[0] != expected_first {
        return Err(ProtocolError::malformed(format!(
            "length byte 0x{:02X} disagrees with payload length {}",
            frame[0], payload_length
        )));
    }
    if frame.len() != COMMAND_FRAME_OVERHEAD + payload_length {
        return Err(ProtocolError::TruncatedPacket {
            declared: COMMAND_FRAME_OVERHEAD + payload_length,
            actual: frame.len(),
        });
    }

    Ok(CommandHeader {
        command_id: frame[2],
        payload_length,
        multipurpose: frame[1] == MULTIPURPOSE_FRAME_FLAG,
    })
}

// ============================================================================
// Inbound
// ============================================================================

/// A notification received from the droid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyMessage {
    /// Total frame size declared by the first byte.
    pub declared_size: u8,
    /// Undocumented header byte.
    pub reserved1: u8,
    /// Command identifier.
    pub command_id: u8,
    /// Undocumented header byte.
    pub reserved2: u8,
    /// Bytes after the header.
    pub payload: Vec<u8>,
}

impl NotifyMessage {
    /// Decode a notification frame.
    pub fn decode(raw: &[u8]) -> Result<Self, ProtocolError> {
        decode_notification(raw)
    }

    /// Payload rendered as lower-case hex.
    pub fn payload_hex(&self) -> String {
        hex::encode(&self.payload)
    }
}

impl std::fmt::Display for NotifyMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "size={} reserved1=0x{:02X} cmd=0x{:02X} reserved2=0x{:02X} data={}",
            self.declared_size,
            self.reserved1,
            self.command_id,
            self.reserved2,
            self.payload_hex()
        )
    }
}

/// Decode a notification frame, validating its declared size.
pub fn decode_notification(raw: &[u8]) -> Result<NotifyMessage, ProtocolError> {
    let Some(&size_byte) = raw.first() else {
        return Err(ProtocolError::TruncatedPacket {
            declared: NOTIFY_HEADER_LENGTH,
            actual: 0,
        });
    };

    let declared = size_byte
        .checked_sub(NOTIFY_SIZE_OFFSET)
        .ok_or(ProtocolError::TruncatedPacket {
            declared: 0,
            actual: raw.len(),
        })?;

    if raw.len() != declared as usize {
        return Err(ProtocolError::TruncatedPacket {
            declared: declared as usize,
            actual: raw.len(),
        });
    }
    if raw.len() < NOTIFY_HEADER_LENGTH {
        return Err(ProtocolError::TruncatedPacket {
            declared: NOTIFY_HEADER_LENGTH,
            actual: raw.len(),
        });
    }

    let message = NotifyMessage {
        declared_size: declared,
        reserved1: raw[1],
        command_id: raw[2],
        reserved2: raw[3],
        payload: raw[NOTIFY_HEADER_LENGTH..].to_vec(),
    };
    log::trace!("decoded notification: {}", message);
    Ok(message)
}

/// Encode a notification the way the droid would. Used to drive tests and
/// simulated devices.
pub fn encode_notification(command_id: u8, reserved1: u8, reserved2: u8, payload: &[u8]) -> Vec<u8> {
    let total = NOTIFY_HEADER_LENGTH + payload.len();
    let mut buf = Vec::with_capacity(total);
    buf.put_u8((total as u8).wrapping_add(NOTIFY_SIZE_OFFSET));
    buf.put_u8(reserved1);
    buf.put_u8(command_id);
    buf.put_u8(reserved2);
    buf.extend_from_slice(payload);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Command Frames
    // ========================================================================

    #[test]
    fn test_encode_heartbeat() {
        let frame = encode_command(CMD_CONNECTION_HEARTBEAT, &[]).unwrap();
        assert_eq!(frame, vec![0x23, 0x00, 0x0E, 0x40]);
    }

    #[test]
    fn test_encode_with_payload() {
        let frame = encode_command(CMD_SET_PAIRING_LED, &[0x00, 0xFF]).unwrap();
        assert_eq!(frame, vec![0x25, 0x00, 0x02, 0x42, 0x00, 0xFF]);
    }

    #[test]
    fn test_multipurpose_flag_only_for_multipurpose() {
        let frame = encode_command(CMD_MULTIPURPOSE, &[0x44, 0x00]).unwrap();
        assert_eq!(frame[1], 0x42);

        for id in [0u8, 1, 14, 16, 0x8F] {
            let frame = encode_command(id, &[0x44, 0x00]).unwrap();
            assert_eq!(frame[1], 0x00, "command 0x{:02X}", id);
        }
    }

    #[test]
    fn test_encode_command_hex() {
        let frame = encode_command_hex(CMD_SET_PAIRING_LED, "00ff").unwrap();
        assert_eq!(frame, vec![0x25, 0x00, 0x02, 0x42, 0x00, 0xFF]);

        let err = encode_command_hex(CMD_SET_PAIRING_LED, "00f").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload(_)));

        let err = encode_command_hex(CMD_SET_PAIRING_LED, "zz").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload(_)));
    }

    #[test]
    fn test_payload_too_long() {
        let payload = vec![0u8; MAX_COMMAND_PAYLOAD + 1];
        assert_eq!(
            encode_command(1, &payload),
            Err(ProtocolError::PayloadTooLong {
                max: MAX_COMMAND_PAYLOAD,
                actual: MAX_COMMAND_PAYLOAD + 1
            })
        );
        assert!(CommandFrame::new(1, payload).is_err());
    }

    #[test]
    fn test_header_recovers_id_and_length() {
        for command_id in [0u8, 1, 5, 14, 15, 0x81, 0xFF] {
            for len in 0..=MAX_COMMAND_PAYLOAD {
                let payload = vec![0xA5; len];
                let frame = encode_command(command_id, &payload).unwrap();
                let header = decode_command_header(&frame).unwrap();
                assert_eq!(header.command_id, command_id);
                assert_eq!(header.payload_length, len);
                assert_eq!(header.multipurpose, command_id == CMD_MULTIPURPOSE);
            }
        }
    }

    #[test]
    fn test_multipurpose_payload() {
        let frame = encode_multipurpose(SUB_AUDIO_CONTROLLER, &[0x0E, 0x14]).unwrap();
        assert_eq!(frame.command_id, CMD_MULTIPURPOSE);
        assert_eq!(frame.payload, vec![0x44, 0x00, 0x0E, 0x14]);
        assert_eq!(
            frame.encode().unwrap(),
            vec![0x27, 0x42, 0x0F, 0x44, 0x44, 0x00, 0x0E, 0x14]
        );
    }

    #[test]
    fn test_decimal_digits_byte() {
        assert_eq!(decimal_digits_byte(0).unwrap(), 0x00);
        assert_eq!(decimal_digits_byte(5).unwrap(), 0x05);
        assert_eq!(decimal_digits_byte(12).unwrap(), 0x12);
        assert_eq!(decimal_digits_byte(99).unwrap(), 0x99);
        assert!(decimal_digits_byte(100).is_err());
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    #[test]
    fn test_decode_notification() {
        let raw = encode_notification(NOTIFY_FIRMWARE_INFO_RESPONSE, 0x01, 0x02, &KNOWN_FIRMWARE_SIGNATURE);
        assert_eq!(raw[0], 16 + 0x1F);

        let message = decode_notification(&raw).unwrap();
        assert_eq!(message.declared_size, 16);
        assert_eq!(message.reserved1, 0x01);
        assert_eq!(message.command_id, NOTIFY_FIRMWARE_INFO_RESPONSE);
        assert_eq!(message.reserved2, 0x02);
        assert_eq!(message.payload, KNOWN_FIRMWARE_SIGNATURE.to_vec());
        assert_eq!(message.payload_hex(), "4b1001444411110100000000");
    }

    #[test]
    fn test_decode_header_only_notification() {
        let raw = [0x23, 0x00, 0x80, 0x00];
        let message = decode_notification(&raw).unwrap();
        assert!(message.payload.is_empty());
    }

    #[test]
    fn test_decode_truncated_notification() {
        let mut raw = encode_notification(NOTIFY_RUNIT_HEAD_EVENT, 0, 0, &[0x00, 0x02]);
        raw[0] -= 1;
        assert_eq!(
            decode_notification(&raw),
            Err(ProtocolError::TruncatedPacket {
                declared: 5,
                actual: 6
            })
        );

        let raw = encode_notification(NOTIFY_RUNIT_HEAD_EVENT, 0, 0, &[0x00, 0x02]);
        assert!(decode_notification(&raw[..5]).is_err());
    }

    #[test]
    fn test_decode_garbage_notification() {
        assert!(decode_notification(&[]).is_err());
        assert!(decode_notification(&[0x00, 0x01, 0x02, 0x03]).is_err());
        // Size matches but there is no room for the header.
        assert!(matches!(
            decode_notification(&[0x20]),
            Err(ProtocolError::TruncatedPacket { declared: 4, actual: 1 })
        ));
    }
}

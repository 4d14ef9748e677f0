//! Protocol constants
//!
//! Command identifiers, multipurpose sub-commands, frame header markers and
//! the BLE identifiers used by Droid Depot droids.

use crate::error::ProtocolError;

// ============================================================================
// Frame Header Markers
// ============================================================================

/// Number of header bytes counted in the first byte of a command frame.
pub const COMMAND_HEADER_LENGTH: usize = 3;
/// Total header bytes written before the payload of a command frame.
pub const COMMAND_FRAME_OVERHEAD: usize = 4;
/// Bit set in the first byte of every outbound command frame.
pub const COMMAND_FRAME_MARKER: u8 = 0x20;
/// Offset added to the payload length in the fourth header byte.
pub const PAYLOAD_LENGTH_MARKER: u8 = 0x40;
/// Second header byte of multipurpose command frames.
pub const MULTIPURPOSE_FRAME_FLAG: u8 = 0x42;
/// Largest payload a command frame can carry.
pub const MAX_COMMAND_PAYLOAD: usize = 252;

/// Offset subtracted from the first byte of a notification to get its size.
pub const NOTIFY_SIZE_OFFSET: u8 = 0x1F;
/// Fixed header bytes at the start of every notification frame.
pub const NOTIFY_HEADER_LENGTH: usize = 4;

/// First payload byte of every multipurpose command.
pub const MULTIPURPOSE_PAYLOAD_PREFIX: u8 = 0x44;

// ============================================================================
// Command Identifiers
// ============================================================================

/// Request the firmware information block.
pub const CMD_RETRIEVE_FIRMWARE_INFO: u8 = 1;
/// Set the pairing LED state.
pub const CMD_SET_PAIRING_LED: u8 = 2;
/// Set the RGB LED state.
pub const CMD_SET_RGB_LED: u8 = 3;
/// Flash the pairing LED.
pub const CMD_FLASH_PAIRING_LED: u8 = 4;
/// Set a motor's speed.
pub const CMD_SET_MOTOR_SPEED: u8 = 5;
/// Write a command into an open script.
pub const CMD_SCRIPT_WRITE: u8 = 6;
/// Open, close or execute a script.
pub const CMD_SCRIPT_ACTION: u8 = 12;
/// Delay inside a script.
pub const CMD_SCRIPT_DELAY: u8 = 13;
/// Harmless command sent periodically to keep the connection alive.
pub const CMD_CONNECTION_HEARTBEAT: u8 = 14;
/// Umbrella command whose payload selects a sub-command.
pub const CMD_MULTIPURPOSE: u8 = 15;

/// Notification raised by R-unit head motor activity.
pub const NOTIFY_RUNIT_HEAD_EVENT: u8 = 128;
/// Notification answering [`CMD_RETRIEVE_FIRMWARE_INFO`].
pub const NOTIFY_FIRMWARE_INFO_RESPONSE: u8 = 129;

/// Command identifiers understood by the droid firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DroidCommandId {
    /// Request the firmware information block.
    RetrieveFirmwareInformation = CMD_RETRIEVE_FIRMWARE_INFO,
    /// Set the pairing LED state.
    SetPairingLedState = CMD_SET_PAIRING_LED,
    /// Set the RGB LED state.
    SetRgbLedState = CMD_SET_RGB_LED,
    /// Flash the pairing LED.
    FlashPairingLed = CMD_FLASH_PAIRING_LED,
    /// Set a motor's speed.
    SetMotorSpeed = CMD_SET_MOTOR_SPEED,
    /// Write into an open script.
    ScriptWrite = CMD_SCRIPT_WRITE,
    /// Script open/close/execute.
    ScriptAction = CMD_SCRIPT_ACTION,
    /// Script delay.
    ScriptDelay = CMD_SCRIPT_DELAY,
    /// Keep-alive.
    ConnectionHeartbeat = CMD_CONNECTION_HEARTBEAT,
    /// Multipurpose umbrella command.
    Multipurpose = CMD_MULTIPURPOSE,
    /// R-unit head motor event notification.
    RUnitHeadEvent = NOTIFY_RUNIT_HEAD_EVENT,
    /// Firmware information response notification.
    FirmwareInformationResponse = NOTIFY_FIRMWARE_INFO_RESPONSE,
}

impl TryFrom<u8> for DroidCommandId {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            CMD_RETRIEVE_FIRMWARE_INFO => Ok(DroidCommandId::RetrieveFirmwareInformation),
            CMD_SET_PAIRING_LED => Ok(DroidCommandId::SetPairingLedState),
            CMD_SET_RGB_LED => Ok(DroidCommandId::SetRgbLedState),
            CMD_FLASH_PAIRING_LED => Ok(DroidCommandId::FlashPairingLed),
            CMD_SET_MOTOR_SPEED => Ok(DroidCommandId::SetMotorSpeed),
            CMD_SCRIPT_WRITE => Ok(DroidCommandId::ScriptWrite),
            CMD_SCRIPT_ACTION => Ok(DroidCommandId::ScriptAction),
            CMD_SCRIPT_DELAY => Ok(DroidCommandId::ScriptDelay),
            CMD_CONNECTION_HEARTBEAT => Ok(DroidCommandId::ConnectionHeartbeat),
            CMD_MULTIPURPOSE => Ok(DroidCommandId::Multipurpose),
            NOTIFY_RUNIT_HEAD_EVENT => Ok(DroidCommandId::RUnitHeadEvent),
            NOTIFY_FIRMWARE_INFO_RESPONSE => Ok(DroidCommandId::FirmwareInformationResponse),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}

impl From<DroidCommandId> for u8 {
    fn from(id: DroidCommandId) -> Self {
        id as u8
    }
}

// ============================================================================
// Multipurpose Sub-commands
// ============================================================================

/// Audio controller sub-command.
pub const SUB_AUDIO_CONTROLLER: u8 = 0;
/// Center the R-unit head.
pub const SUB_CENTER_RUNIT_HEAD: u8 = 1;
/// Rotate the R-unit head with ramping.
pub const SUB_ROTATE_RUNIT_HEAD: u8 = 2;
/// Rotate the R-unit head without ramping.
pub const SUB_ROTATE_RUNIT_HEAD_NO_RAMP: u8 = 3;
/// Rotate the B-unit head.
pub const SUB_ROTATE_BUNIT_HEAD: u8 = 4;
/// Drive a B-unit.
pub const SUB_DRIVE_BUNIT: u8 = 5;

// ============================================================================
// Audio Controller Commands (multipurpose sub-command 0)
// ============================================================================

/// Set the playback volume.
pub const AUDIO_SET_VOLUME: u8 = 14;
/// Play a clip from a bank chosen by value.
pub const AUDIO_PLAY_FROM_GROUP: u8 = 16;
/// Play a clip from the selected bank.
pub const AUDIO_PLAY_FROM_SELECTED_GROUP: u8 = 24;
/// Cycle through the selected bank.
pub const AUDIO_CYCLE_SELECTED_GROUP: u8 = 28;
/// Select the active sound bank.
pub const AUDIO_SET_SELECTED_BANK: u8 = 31;

// ============================================================================
// Scripts
// ============================================================================

/// Open a script for writing.
pub const SCRIPT_ACTION_OPEN: u8 = 0;
/// Close the open script (also stops a running one).
pub const SCRIPT_ACTION_CLOSE: u8 = 1;
/// Execute a script.
pub const SCRIPT_ACTION_EXECUTE: u8 = 2;

/// Lowest script id a park location beacon may reference.
pub const MIN_LOCATION_SCRIPT: u8 = 1;
/// Highest script id a park location beacon may reference.
pub const MAX_LOCATION_SCRIPT: u8 = 7;
/// Highest script id programmed at the factory.
pub const MAX_FACTORY_SCRIPT: u8 = 13;
/// First pairing sequence played after connecting.
pub const SCRIPT_PAIRING_SEQUENCE: u8 = 11;
/// Motor stress test. Never executed from this library.
pub const SCRIPT_FULL_THROTTLE_TEST: u8 = 13;

// ============================================================================
// Motors
// ============================================================================

/// Forward / left direction nibble.
pub const MOTOR_DIRECTION_FORWARD: u8 = 0;
/// Backwards / right direction nibble.
pub const MOTOR_DIRECTION_BACKWARDS: u8 = 8;
/// Head rotation to the left.
pub const MOTOR_DIRECTION_LEFT: u8 = MOTOR_DIRECTION_FORWARD;
/// Head rotation to the right.
pub const MOTOR_DIRECTION_RIGHT: u8 = MOTOR_DIRECTION_BACKWARDS;

/// Left drive motor.
pub const MOTOR_LEFT: u8 = 0;
/// Right drive motor.
pub const MOTOR_RIGHT: u8 = 1;
/// Head motor.
pub const MOTOR_HEAD: u8 = 2;

// ============================================================================
// BLE Identifiers
// ============================================================================

/// Manufacturer id carried in droid advertisements.
pub const DROID_MANUFACTURER_ID: u16 = 387;
/// Manufacturer id of park iBeacons.
pub const DISNEY_IBEACON_MANUFACTURER_ID: u16 = 76;

/// Primary GATT service of the droid.
pub const DROID_SERVICE_UUID: &str = "09b600a0-3e42-41fc-b474-e9c0c8f0c801";
/// Characteristic commands are written to.
pub const DROID_COMMAND_CHARACTERISTIC: &str = "09b600b1-3e42-41fc-b474-e9c0c8f0c801";
/// Characteristic notifications arrive on.
pub const DROID_NOTIFY_CHARACTERISTIC: &str = "09b600b0-3e42-41fc-b474-e9c0c8f0c801";

/// Attribute handle the connection handshake is written to.
pub const HANDSHAKE_HANDLE: u16 = 0x000D;
/// Handshake bytes written (twice) right after connecting.
pub const CONNECT_HANDSHAKE: [u8; 3] = [0x22, 0x20, 0x01];

/// Payload of the firmware information response for the known firmware.
pub const KNOWN_FIRMWARE_SIGNATURE: [u8; 12] = [
    0x4b, 0x10, 0x01, 0x44, 0x44, 0x11, 0x11, 0x01, 0x00, 0x00, 0x00, 0x00,
];

//! Proximity beacon payloads.
//!
//! Two beacon formats are understood:
//!
//! - **Location beacons** are broadcast by park installations and ask nearby
//!   droids to run one of the area reaction scripts:
//!   `0A 04 <script_id> <interval> <dbm_byte> <paired>`
//! - **Identity beacons** are broadcast by droids themselves and describe
//!   their affiliation and personality:
//!   `03 04 44 <0x80 + paired> <affiliation * 2 + 0x80> <personality>`

use crate::constants::{MAX_LOCATION_SCRIPT, MIN_LOCATION_SCRIPT};
use crate::error::ProtocolError;

/// Beacon type byte of a location beacon.
pub const LOCATION_BEACON_TYPE: u8 = 0x0A;
/// Beacon type byte of an identity beacon.
pub const IDENTITY_BEACON_TYPE: u8 = 0x03;
/// Length byte following the beacon type.
pub const BEACON_DATA_LENGTH: u8 = 0x04;
/// Total size of either beacon payload.
pub const BEACON_PAYLOAD_SIZE: usize = 6;

/// Offset of the identity beacon data length byte.
const IDENTITY_LENGTH_BIAS: u8 = 0x40;
/// Bias applied to the paired flag and affiliation bytes.
const IDENTITY_FIELD_BIAS: u8 = 0x80;
/// Largest affiliation id that still fits after `* 2 + 0x80`.
pub const MAX_AFFILIATION_ID: u8 = 0x3F;

/// Reference point of the signal strength transform.
const DBM_REFERENCE: i16 = 0x80;

// ============================================================================
// Signal Strength
// ============================================================================

/// Encode a dBm value the way park beacons carry it: `0x80 - dbm`, wrapped
/// to a byte.
pub fn dbm_to_byte(dbm: i8) -> u8 {
    (DBM_REFERENCE - dbm as i16) as u8
}

/// Inverse of [`dbm_to_byte`].
pub fn byte_to_dbm(byte: u8) -> i8 {
    (DBM_REFERENCE - byte as i16) as i8
}

// ============================================================================
// Location Beacons
// ============================================================================

/// A park location beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationBeacon {
    /// Area reaction script to run (1..=7).
    pub script_id: u8,
    /// Reaction interval, in units of five seconds.
    pub reaction_interval: u8,
    /// Minimum signal strength to react to.
    pub signal_strength_dbm: i8,
    /// Whether the beacon targets paired droids.
    pub droid_paired: bool,
}

impl LocationBeacon {
    /// Encode to the six byte payload.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        encode_location_beacon(
            self.script_id,
            self.reaction_interval,
            self.signal_strength_dbm,
            self.droid_paired,
        )
    }

    /// Decode from raw payload bytes.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        decode_location_beacon(payload)
    }
}

/// Encode a location beacon payload.
pub fn encode_location_beacon(
    script_id: u8,
    reaction_interval: u8,
    signal_strength_dbm: i8,
    droid_paired: bool,
) -> Result<Vec<u8>, ProtocolError> {
    if !(MIN_LOCATION_SCRIPT..=MAX_LOCATION_SCRIPT).contains(&script_id) {
        return Err(ProtocolError::InvalidScriptId(script_id as i32));
    }

    Ok(vec![
        LOCATION_BEACON_TYPE,
        BEACON_DATA_LENGTH,
        script_id,
        reaction_interval,
        dbm_to_byte(signal_strength_dbm),
        droid_paired as u8,
    ])
}

/// Decode a location beacon payload.
pub fn decode_location_beacon(payload: &[u8]) -> Result<LocationBeacon, ProtocolError> {
    check_beacon_header(payload, LOCATION_BEACON_TYPE)?;

    Ok(LocationBeacon {
        script_id: payload[2],
        reaction_interval: payload[3],
        signal_strength_dbm: byte_to_dbm(payload[4]),
        droid_paired: payload[5] != 0,
    })
}

/// Decode a location beacon given as hex text, e.g. `0A040102A601`.
pub fn decode_location_beacon_hex(payload: &str) -> Result<LocationBeacon, ProtocolError> {
    decode_location_beacon(&decode_hex(payload)?)
}

// ============================================================================
// Identity Beacons
// ============================================================================

/// A droid identity beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityBeacon {
    /// Number of data bytes following the length byte.
    pub data_length: u8,
    /// Whether the droid is paired with a remote.
    pub droid_paired: bool,
    /// Affiliation id.
    pub affiliation_id: u8,
    /// Personality (droid or chip) id.
    pub personality_id: u8,
}

impl IdentityBeacon {
    /// Decode from raw payload bytes.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        decode_identity_beacon(payload)
    }
}

/// Encode an identity beacon payload.
pub fn encode_identity_beacon(
    droid_paired: bool,
    affiliation_id: u8,
    personality_id: u8,
) -> Result<Vec<u8>, ProtocolError> {
    if affiliation_id > MAX_AFFILIATION_ID {
        return Err(ProtocolError::InvalidAffiliation(affiliation_id));
    }

    Ok(vec![
        IDENTITY_BEACON_TYPE,
        BEACON_DATA_LENGTH,
        IDENTITY_LENGTH_BIAS + BEACON_DATA_LENGTH,
        IDENTITY_FIELD_BIAS + droid_paired as u8,
        affiliation_id * 2 + IDENTITY_FIELD_BIAS,
        personality_id,
    ])
}

/// Decode an identity beacon payload.
pub fn decode_identity_beacon(payload: &[u8]) -> Result<IdentityBeacon, ProtocolError> {
    check_beacon_header(payload, IDENTITY_BEACON_TYPE)?;

    let data_length = payload[2].checked_sub(IDENTITY_LENGTH_BIAS).ok_or_else(|| {
        ProtocolError::malformed(format!("identity length byte 0x{:02X}", payload[2]))
    })?;

    let droid_paired = match payload[3].wrapping_sub(IDENTITY_FIELD_BIAS) {
        0 => false,
        1 => true,
        _ => {
            return Err(ProtocolError::malformed(format!(
                "identity paired byte 0x{:02X}",
                payload[3]
            )))
        }
    };

    Ok(IdentityBeacon {
        data_length,
        droid_paired,
        affiliation_id: affiliation_from_byte(payload[4])?,
        personality_id: payload[5],
    })
}

/// Decode an identity beacon given as hex text.
pub fn decode_identity_beacon_hex(payload: &str) -> Result<IdentityBeacon, ProtocolError> {
    decode_identity_beacon(&decode_hex(payload)?)
}

/// Recover an affiliation id from its biased byte.
///
/// Odd bytes and bytes below the bias never come out of the encoder and are
/// rejected.
pub fn affiliation_from_byte(byte: u8) -> Result<u8, ProtocolError> {
    match byte.checked_sub(IDENTITY_FIELD_BIAS) {
        Some(biased) if biased % 2 == 0 => Ok(biased / 2),
        _ => Err(ProtocolError::malformed(format!(
            "affiliation byte 0x{:02X}",
            byte
        ))),
    }
}

/// Render a beacon payload the way the published beacon tables list them.
pub fn beacon_to_hex(payload: &[u8]) -> String {
    hex::encode_upper(payload)
}

fn decode_hex(payload: &str) -> Result<Vec<u8>, ProtocolError> {
    hex::decode(payload)
        .map_err(|e| ProtocolError::malformed(format!("beacon payload {:?}: {}", payload, e)))
}

fn check_beacon_header(payload: &[u8], beacon_type: u8) -> Result<(), ProtocolError> {
    if payload.len() != BEACON_PAYLOAD_SIZE {
        return Err(ProtocolError::TruncatedPacket {
            declared: BEACON_PAYLOAD_SIZE,
            actual: payload.len(),
        });
    }
    if payload[0] != beacon_type || payload[1] != BEACON_DATA_LENGTH {
        return Err(ProtocolError::malformed(format!(
            "expected beacon header {:02X}{:02X}, got {:02X}{:02X}",
            beacon_type, BEACON_DATA_LENGTH, payload[0], payload[1]
        )));
    }
    Ok(())
}

// ============================================================================
// Official Park Beacons
// ============================================================================

/// A location beacon installed in one of the parks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkBeacon {
    /// Where the beacon is installed.
    pub name: &'static str,
    /// Advertised payload, upper-case hex.
    pub payload: &'static str,
}

/// Location beacons published for Disneyland (`DL_`) and Walt Disney World
/// (`WDW_`).
pub static OFFICIAL_LOCATION_BEACONS: &[ParkBeacon] = &[
    ParkBeacon { name: "DL_Marketplace", payload: "0A040102A601" },
    ParkBeacon { name: "DL_BehindDroidDepot", payload: "0A040202A601" },
    ParkBeacon { name: "DL_Resistance", payload: "0A040302A601" },
    ParkBeacon { name: "DL_FirstOrder", payload: "0A040702A601" },
    ParkBeacon { name: "DL_DroidDepot", payload: "0A040318BA01" },
    ParkBeacon { name: "DL_InFrontOfOgas", payload: "0A0405FFA601" },
    ParkBeacon { name: "DL_MarketplaceEntrance", payload: "0A040502A601" },
    ParkBeacon { name: "WDW_OutdoorsArea", payload: "0A040102A601" },
    ParkBeacon { name: "WDW_BehindDroidDepot", payload: "0A040202A601" },
    ParkBeacon { name: "WDW_Resistance", payload: "0A040302A601" },
    ParkBeacon { name: "WDW_DokOndars", payload: "0A040602A601" },
    ParkBeacon { name: "WDW_FirstOrder", payload: "0A040702A601" },
    ParkBeacon { name: "WDW_Marketplace", payload: "0A040618BA01" },
    ParkBeacon { name: "WDW_DroidDetector", payload: "0A0405FFA601" },
    ParkBeacon { name: "WDW_InFrontOfOgas", payload: "0A0407FFA601" },
];

/// Look up an official beacon by name.
pub fn official_beacon(name: &str) -> Option<&'static ParkBeacon> {
    OFFICIAL_LOCATION_BEACONS.iter().find(|b| b.name == name)
}

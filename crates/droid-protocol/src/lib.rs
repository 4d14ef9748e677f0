//! Droid Depot BLE Protocol
//!
//! This crate provides types and utilities for talking to Droid Depot droids
//! over Bluetooth LE. It is pure byte manipulation: nothing here touches a
//! radio or a runtime.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → droid): a 4 byte header followed by the payload.
//!   Multipurpose commands (id `0x0F`) carry a sub-command in their payload.
//! - **Notifications** (droid → host): the first byte minus `0x1F` is the
//!   frame length and the third byte is the notification id (`0x80`+).
//! - **Beacons**: 6 byte manufacturer data payloads advertised by park
//!   locations and by droids themselves.
//!
//! # Example
//!
//! ```rust,ignore
//! use droid_protocol::{Command, decode_notification, decode_location_beacon};
//!
//! // Build a command
//! let frame = Command::execute_script(3)?.encode()?;
//!
//! // Parse a notification
//! let message = decode_notification(&received)?;
//!
//! // Parse a park beacon
//! let beacon = decode_location_beacon(&[0x0A, 0x04, 0x01, 0x02, 0xA6, 0x01])?;
//! ```

mod beacon;
mod commands;
mod constants;
mod error;
mod frame;
pub mod hardware;

pub use beacon::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use hardware::Affiliation;

//! # droid-link
//!
//! Async link engine for Droid Depot droids.
//!
//! This crate sits between a BLE stack and application code. The BLE stack
//! supplies a [`DroidTransport`] for writes and an mpsc channel of raw
//! notifications; this crate handles the rest.
//!
//! ## Features
//!
//! - **Correlation**: [`ResponseRouter`] matches notifications to requests,
//!   first-in first-out per command id, with a per-request timeout
//! - **Keep-alive**: [`Heartbeat`] writes the heartbeat command while the
//!   transport is connected
//! - **Notifications**: [`NotificationProcessor`] decodes inbound frames,
//!   publishes head motor events and feeds the router
//! - **Park reactions**: [`ReactionDebouncer`] and [`ReactionScanner`] rate
//!   limit reactions to location beacons
//! - **Configuration**: [`LinkConfig`], loadable from YAML

mod config;
mod connection;
mod correlation;
mod error;
mod heartbeat;
mod notify;
mod reaction;
mod transport;

pub use config::LinkConfig;
pub use connection::{DroidConnection, DroidIdentity};
pub use correlation::{PendingResponse, ResponseRouter};
pub use error::{LinkError, Result};
pub use heartbeat::Heartbeat;
pub use notify::{MotorEvent, NotificationProcessor};
pub use reaction::{ReactionDebouncer, ReactionHandler, ReactionOutcome, ReactionScanner, ScanReport};
pub use transport::{DroidTransport, LoopbackTransport, WriteTarget};

// Re-export the protocol crate for callers that only depend on the link.
pub use droid_protocol as protocol;

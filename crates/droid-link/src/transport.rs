//! Transport abstraction.
//!
//! The link never touches a radio directly. A [`DroidTransport`] writes bytes
//! to the droid and reports the connection state; notifications flow the other
//! way through an mpsc channel fed by whoever owns the BLE stack.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{LinkError, Result};

/// Where a write goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteTarget {
    /// The command characteristic.
    Command,
    /// A raw attribute handle.
    Handle(u16),
}

/// A byte pipe to a single droid.
#[async_trait]
pub trait DroidTransport: Send + Sync {
    /// Establish the connection.
    async fn connect(&self) -> Result<()>;

    /// Tear the connection down.
    async fn disconnect(&self) -> Result<()>;

    /// Write bytes to the droid.
    async fn write(&self, target: WriteTarget, data: &[u8]) -> Result<()>;

    /// Whether the connection is up.
    fn is_connected(&self) -> bool;
}

/// In-memory transport that records every write.
///
/// Connection state can be flipped from the outside to simulate a droid
/// walking out of range.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    connected: AtomicBool,
    writes: Mutex<Vec<(WriteTarget, Vec<u8>)>>,
    fail_writes: AtomicBool,
}

impl LoopbackTransport {
    /// Create a disconnected loopback transport.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Force the connection state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Everything written so far.
    pub fn writes(&self) -> Vec<(WriteTarget, Vec<u8>)> {
        self.writes.lock().clone()
    }

    /// Frames written to the command characteristic.
    pub fn command_writes(&self) -> Vec<Vec<u8>> {
        self.writes
            .lock()
            .iter()
            .filter(|(target, _)| *target == WriteTarget::Command)
            .map(|(_, data)| data.clone())
            .collect()
    }

    /// Forget recorded writes.
    pub fn clear(&self) {
        self.writes.lock().clear();
    }
}

#[async_trait]
impl DroidTransport for LoopbackTransport {
    async fn connect(&self) -> Result<()> {
        self.set_connected(true);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.set_connected(false);
        Ok(())
    }

    async fn write(&self, target: WriteTarget, data: &[u8]) -> Result<()> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LinkError::transport("loopback write failure"));
        }
        self.writes.lock().push((target, data.to_vec()));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

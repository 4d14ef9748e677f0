//! Connection keep-alive.
//!
//! The droid drops idle connections, so a harmless heartbeat command is
//! written periodically for as long as the transport reports a connection.

use std::sync::Arc;
use std::time::Duration;

use droid_protocol::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::transport::{DroidTransport, WriteTarget};

/// Handle to a running heartbeat task.
#[derive(Debug)]
pub struct Heartbeat {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Heartbeat {
    /// Spawn the heartbeat loop on the current runtime.
    pub fn start(transport: Arc<dyn DroidTransport>, interval: Duration) -> Result<Self> {
        let frame = Command::Heartbeat.encode()?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_heartbeat(transport, frame, interval, stop_rx));
        debug!(interval_ms = interval.as_millis() as u64, "heartbeat started");
        Ok(Heartbeat { stop_tx, task })
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the loop to stop and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "heartbeat task ended abnormally");
        }
    }
}

async fn run_heartbeat(
    transport: Arc<dyn DroidTransport>,
    frame: Vec<u8>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    while transport.is_connected() && !*stop.borrow() {
        if let Err(e) = transport.write(WriteTarget::Command, &frame).await {
            if !transport.is_connected() {
                break;
            }
            warn!(error = %e, "heartbeat write failed");
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
    debug!("heartbeat stopped");
}

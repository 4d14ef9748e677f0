//! Request/response correlation.
//!
//! The droid answers requests with notifications that carry only a command id,
//! so responses are matched to waiters first-in first-out per command id.
//! Waiters live in an arena keyed by a monotonically increasing id; each
//! command id has a queue of arena ids in registration order.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use droid_protocol::NotifyMessage;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::{LinkError, Result};

/// A registered wait for a response.
#[derive(Debug)]
pub struct PendingResponse {
    id: u64,
    command_id: u8,
    created_at: Instant,
    rx: oneshot::Receiver<Vec<u8>>,
}

impl PendingResponse {
    /// Command id this wait resolves on.
    pub fn command_id(&self) -> u8 {
        self.command_id
    }

    /// When the wait was registered.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

#[derive(Debug, Default)]
struct RouterState {
    next_id: u64,
    queues: HashMap<u8, VecDeque<u64>>,
    waiters: HashMap<u64, oneshot::Sender<Vec<u8>>>,
}

impl RouterState {
    fn remove(&mut self, command_id: u8, id: u64) -> bool {
        let removed = self.waiters.remove(&id).is_some();
        if let Some(queue) = self.queues.get_mut(&command_id) {
            queue.retain(|queued| *queued != id);
            if queue.is_empty() {
                self.queues.remove(&command_id);
            }
        }
        removed
    }
}

/// Matches inbound notifications to outstanding requests.
#[derive(Debug, Default)]
pub struct ResponseRouter {
    state: Mutex<RouterState>,
}

impl ResponseRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the next notification carrying `command_id`.
    ///
    /// Register before writing the request so a fast response cannot slip
    /// past.
    pub fn register_wait(&self, command_id: u8) -> PendingResponse {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.waiters.insert(id, tx);
        state.queues.entry(command_id).or_default().push_back(id);
        trace!(command_id, id, "registered response waiter");

        PendingResponse {
            id,
            command_id,
            created_at: Instant::now(),
            rx,
        }
    }

    /// Wait for the response or give up after `timeout`.
    ///
    /// On timeout the waiter is removed, so a late notification goes to the
    /// next waiter or is dropped. A payload delivered just before removal is
    /// still returned.
    pub async fn await_response(&self, handle: PendingResponse, timeout: Duration) -> Result<Vec<u8>> {
        let PendingResponse {
            id,
            command_id,
            created_at,
            mut rx,
        } = handle;

        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(payload)) => {
                debug!(
                    command_id,
                    elapsed_ms = created_at.elapsed().as_millis() as u64,
                    "response received"
                );
                Ok(payload)
            }
            Ok(Err(_)) | Err(_) => {
                let removed = self.state.lock().remove(command_id, id);
                if !removed {
                    if let Ok(payload) = rx.try_recv() {
                        return Ok(payload);
                    }
                }
                warn!(command_id, timeout_ms = timeout.as_millis() as u64, "response timed out");
                Err(LinkError::TimedOut {
                    command_id,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Withdraw a wait that will never be awaited.
    pub fn cancel(&self, handle: PendingResponse) {
        self.state.lock().remove(handle.command_id, handle.id);
    }

    /// Resolve the oldest live waiter for the notification's command id.
    ///
    /// Returns `true` if a waiter took the payload.
    pub fn on_notification(&self, message: &NotifyMessage) -> bool {
        let mut state = self.state.lock();
        let command_id = message.command_id;

        loop {
            let Some(id) = state.queues.get_mut(&command_id).and_then(|q| q.pop_front()) else {
                break;
            };
            if state.queues.get(&command_id).is_some_and(|q| q.is_empty()) {
                state.queues.remove(&command_id);
            }
            let Some(tx) = state.waiters.remove(&id) else {
                continue;
            };
            if tx.send(message.payload.clone()).is_ok() {
                trace!(command_id, id, "resolved response waiter");
                return true;
            }
            trace!(command_id, id, "skipping abandoned waiter");
        }

        warn!(
            command_id,
            payload = %message.payload_hex(),
            "no pending request for notification, dropping"
        );
        false
    }

    /// Number of outstanding waiters.
    pub fn pending(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Number of outstanding waiters for one command id.
    pub fn pending_for(&self, command_id: u8) -> usize {
        self.state
            .lock()
            .queues
            .get(&command_id)
            .map_or(0, VecDeque::len)
    }
}

//! Park beacon reactions.
//!
//! Location beacons advertise a script and a reaction interval. A droid reacts
//! to at most one beacon per scan batch, and never to the same beacon again
//! before its window has passed. The window is the advertised interval scaled
//! by the configured multiplier, with a floor of one minute by default.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use droid_protocol::{decode_location_beacon, LocationBeacon};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::LinkConfig;
use crate::error::Result;

/// Something that runs a script when a beacon is in range.
#[async_trait]
pub trait ReactionHandler: Send + Sync {
    /// React to a beacon by running `script_id`.
    async fn react(&self, script_id: u8) -> Result<()>;
}

/// Outcome of one scan batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Nothing was eligible or the batch was empty.
    Idle,
    /// The droid reacted to `address`.
    Reacted {
        /// Beacon address.
        address: String,
        /// Script that ran.
        script_id: u8,
    },
}

/// Rate limits reactions per beacon address.
pub struct ReactionDebouncer {
    handler: Arc<dyn ReactionHandler>,
    config: LinkConfig,
    last_reaction: Mutex<HashMap<String, Instant>>,
}

impl ReactionDebouncer {
    /// Create a debouncer that reacts through `handler`.
    pub fn new(handler: Arc<dyn ReactionHandler>, config: LinkConfig) -> Self {
        ReactionDebouncer {
            handler,
            config,
            last_reaction: Mutex::new(HashMap::new()),
        }
    }

    /// When `address` last triggered a reaction.
    pub fn last_reaction(&self, address: &str) -> Option<Instant> {
        self.last_reaction.lock().get(address).copied()
    }

    fn is_eligible(&self, address: &str, beacon: &LocationBeacon, now: Instant) -> bool {
        let required = self.config.reaction_window(beacon.reaction_interval);
        match self.last_reaction.lock().get(address) {
            None => true,
            Some(last) => now.saturating_duration_since(*last) >= required,
        }
    }

    /// Process one batch of visible beacons, in the order given.
    ///
    /// Handler failures are logged and never returned; the failing address
    /// stays eligible and the rest of the batch is still considered.
    pub async fn on_scan_result(&self, visible: &[(String, LocationBeacon)]) -> ReactionOutcome {
        if visible.is_empty() {
            return ReactionOutcome::Idle;
        }

        for (address, beacon) in visible {
            let now = Instant::now();
            if !self.is_eligible(address, beacon, now) {
                debug!(%address, "beacon still in its reaction window");
                continue;
            }

            match self.handler.react(beacon.script_id).await {
                Ok(()) => {
                    self.last_reaction.lock().insert(address.clone(), now);
                    info!(%address, script_id = beacon.script_id, "reacted to beacon");
                    tokio::time::sleep(self.config.reaction_cooldown()).await;
                    return ReactionOutcome::Reacted {
                        address: address.clone(),
                        script_id: beacon.script_id,
                    };
                }
                Err(e) => {
                    error!(%address, script_id = beacon.script_id, error = %e, "reaction failed");
                }
            }
        }

        ReactionOutcome::Idle
    }
}

/// One scan report: advertising address and raw manufacturer data.
pub type ScanReport = Vec<(String, Vec<u8>)>;

/// Feeds scan reports through the debouncer.
pub struct ReactionScanner {
    debouncer: Arc<ReactionDebouncer>,
}

impl ReactionScanner {
    /// Create a scanner around `debouncer`.
    pub fn new(debouncer: Arc<ReactionDebouncer>) -> Self {
        ReactionScanner { debouncer }
    }

    /// Keep only the location beacons of a report.
    pub fn location_beacons(report: &[(String, Vec<u8>)]) -> Vec<(String, LocationBeacon)> {
        report
            .iter()
            .filter_map(|(address, data)| match decode_location_beacon(data) {
                Ok(beacon) => Some((address.clone(), beacon)),
                Err(e) => {
                    debug!(%address, error = %e, "not a location beacon");
                    None
                }
            })
            .collect()
    }

    /// Process reports until the channel closes or `stop` flips to true.
    pub async fn run(&self, mut reports: mpsc::Receiver<ScanReport>, mut stop: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                report = reports.recv() => match report {
                    Some(report) => {
                        let visible = Self::location_beacons(&report);
                        self.debouncer.on_scan_result(&visible).await;
                    }
                    None => break,
                },
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("reaction scanner stopped");
    }
}

//! Inbound notification handling.
//!
//! Every frame the droid sends is decoded here. Head motor events go out on a
//! broadcast channel, firmware responses are checked against the known
//! firmware, and every recognised notification is then offered to the
//! [`ResponseRouter`]. Nothing on this path returns an error to the caller:
//! bad frames are logged and dropped.

use std::sync::Arc;

use droid_protocol::{
    decode_notification, DroidCommandId, NotifyMessage, KNOWN_FIRMWARE_SIGNATURE,
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::correlation::ResponseRouter;

/// Capacity of the motor event broadcast channel.
const MOTOR_EVENT_CAPACITY: usize = 32;

/// R-unit head motor events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorEvent {
    /// Motor started.
    Started,
    /// Head is turning right.
    MovingRight,
    /// Head is turning left.
    MovingLeft,
    /// Motor stopped.
    Stopped,
    /// Head reached its left limit.
    HitLeftLimit,
    /// Head reached its right limit.
    HitRightLimit,
}

impl MotorEvent {
    /// Map an event byte to a motor event.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            2 => Some(MotorEvent::Started),
            3 => Some(MotorEvent::MovingRight),
            4 => Some(MotorEvent::MovingLeft),
            130 => Some(MotorEvent::Stopped),
            131 => Some(MotorEvent::HitLeftLimit),
            132 => Some(MotorEvent::HitRightLimit),
            _ => None,
        }
    }
}

/// Decodes notifications and dispatches them.
#[derive(Debug)]
pub struct NotificationProcessor {
    router: Arc<ResponseRouter>,
    motor_events: broadcast::Sender<MotorEvent>,
}

impl NotificationProcessor {
    /// Create a processor feeding `router`.
    pub fn new(router: Arc<ResponseRouter>) -> Self {
        let (motor_events, _) = broadcast::channel(MOTOR_EVENT_CAPACITY);
        NotificationProcessor {
            router,
            motor_events,
        }
    }

    /// Subscribe to head motor events.
    pub fn subscribe_motor_events(&self) -> broadcast::Receiver<MotorEvent> {
        self.motor_events.subscribe()
    }

    /// Handle one raw notification.
    pub fn handle_raw(&self, raw: &[u8]) {
        match decode_notification(raw) {
            Ok(message) => self.handle(&message),
            Err(e) => warn!(error = %e, raw = %hex::encode(raw), "malformed notification"),
        }
    }

    /// Handle a decoded notification.
    pub fn handle(&self, message: &NotifyMessage) {
        let command = match DroidCommandId::try_from(message.command_id) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, %message, "dropping notification");
                return;
            }
        };
        debug!(?command, %message, "notification");

        match command {
            DroidCommandId::RUnitHeadEvent => self.handle_head_event(message),
            DroidCommandId::FirmwareInformationResponse => check_firmware(&message.payload),
            _ => {}
        }

        self.router.on_notification(message);
    }

    fn handle_head_event(&self, message: &NotifyMessage) {
        let Some(&byte) = message.payload.get(1) else {
            warn!(%message, "head event without event byte");
            return;
        };
        match MotorEvent::from_byte(byte) {
            Some(event) => {
                debug!(?event, "head motor event");
                // No subscribers is fine.
                let _ = self.motor_events.send(event);
            }
            None => warn!(event = byte, "unknown head motor event"),
        }
    }

    /// Drain `rx` until it closes or `stop` flips to true.
    pub async fn run(&self, mut rx: mpsc::Receiver<Vec<u8>>, mut stop: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                raw = rx.recv() => match raw {
                    Some(raw) => self.handle_raw(&raw),
                    None => break,
                },
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("notification loop stopped");
    }
}

fn check_firmware(payload: &[u8]) {
    if payload == KNOWN_FIRMWARE_SIGNATURE.as_slice() {
        info!("firmware matches known version");
    } else {
        warn!(
            firmware = %hex::encode(payload),
            expected = %hex::encode(KNOWN_FIRMWARE_SIGNATURE),
            "unrecognised firmware, behaviour may differ"
        );
    }
}

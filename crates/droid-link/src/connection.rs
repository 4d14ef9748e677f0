//! A connection to one droid.
//!
//! [`DroidConnection`] ties the pieces together: it writes commands through a
//! [`DroidTransport`], owns the [`ResponseRouter`] that requests wait on, and
//! runs the heartbeat for as long as the connection is open.

use std::sync::Arc;

use async_trait::async_trait;
use droid_protocol::{
    affiliation_from_byte, hardware, shutdown_audio_commands, Affiliation, Command, CommandFrame,
    IdentityBeacon, ProtocolError, AUDIO_SET_VOLUME, CONNECT_HANDSHAKE, HANDSHAKE_HANDLE,
    NOTIFY_FIRMWARE_INFO_RESPONSE, SCRIPT_PAIRING_SEQUENCE,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::LinkConfig;
use crate::correlation::ResponseRouter;
use crate::error::{LinkError, Result};
use crate::heartbeat::Heartbeat;
use crate::notify::NotificationProcessor;
use crate::reaction::ReactionHandler;
use crate::transport::{DroidTransport, WriteTarget};

// ============================================================================
// Identity
// ============================================================================

/// Who the droid is, as advertised in its identity beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroidIdentity {
    /// Personality id of the body or chip.
    pub personality_id: u8,
    /// Affiliation id.
    pub affiliation_id: u8,
}

impl Default for DroidIdentity {
    fn default() -> Self {
        DroidIdentity {
            personality_id: hardware::personality::RUNIT,
            affiliation_id: Affiliation::default().id(),
        }
    }
}

impl DroidIdentity {
    /// Identity carried by a decoded identity beacon.
    pub fn from_identity(beacon: &IdentityBeacon) -> Self {
        DroidIdentity {
            personality_id: beacon.personality_id,
            affiliation_id: beacon.affiliation_id,
        }
    }

    /// Identity from raw manufacturer data: the personality is the last byte
    /// and the affiliation is encoded in the byte before it.
    pub fn from_manufacturer_data(data: &[u8]) -> Result<Self> {
        let [.., affiliation_byte, personality_id] = data else {
            return Err(ProtocolError::malformed(format!(
                "manufacturer data too short: {} bytes",
                data.len()
            ))
            .into());
        };
        Ok(DroidIdentity {
            personality_id: *personality_id,
            affiliation_id: affiliation_from_byte(*affiliation_byte)?,
        })
    }

    /// Named affiliation, if the id is one of the known ones.
    pub fn affiliation(&self) -> Option<Affiliation> {
        Affiliation::from_id(self.affiliation_id)
    }
}

// ============================================================================
// Connection
// ============================================================================

/// An open (or openable) link to a droid.
pub struct DroidConnection {
    transport: Arc<dyn DroidTransport>,
    router: Arc<ResponseRouter>,
    config: LinkConfig,
    identity: DroidIdentity,
    heartbeat: Mutex<Option<Heartbeat>>,
}

impl DroidConnection {
    /// Create a connection over `transport`. Nothing is written until
    /// [`open`](Self::open).
    pub fn new(transport: Arc<dyn DroidTransport>, config: LinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(DroidConnection {
            transport,
            router: Arc::new(ResponseRouter::new()),
            config,
            identity: DroidIdentity::default(),
            heartbeat: Mutex::new(None),
        })
    }

    /// Set the droid's identity.
    pub fn with_identity(mut self, identity: DroidIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// The droid's identity.
    pub fn identity(&self) -> DroidIdentity {
        self.identity
    }

    /// Link configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Router that requests on this connection wait on.
    pub fn router(&self) -> Arc<ResponseRouter> {
        self.router.clone()
    }

    /// A notification processor that resolves requests on this connection.
    pub fn notification_processor(&self) -> NotificationProcessor {
        NotificationProcessor::new(self.router.clone())
    }

    /// Whether the transport is connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Whether the heartbeat loop is running.
    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat
            .lock()
            .as_ref()
            .is_some_and(|heartbeat| !heartbeat.is_finished())
    }

    /// Connect, perform the handshake and start the heartbeat.
    pub async fn open(&self) -> Result<()> {
        self.transport.connect().await?;

        // The droid ignores commands until the handshake has been written
        // twice.
        for _ in 0..2 {
            self.transport
                .write(WriteTarget::Handle(HANDSHAKE_HANDLE), &CONNECT_HANDSHAKE)
                .await?;
        }
        info!(personality = self.identity.personality_id, "connected to droid");

        if self.config.play_pairing_sequence {
            self.execute_script(SCRIPT_PAIRING_SEQUENCE).await?;
        }

        let heartbeat = Heartbeat::start(self.transport.clone(), self.config.heartbeat_interval())?;
        if self.heartbeat.lock().replace(heartbeat).is_some() {
            debug!("replaced running heartbeat");
        }
        Ok(())
    }

    /// Stop the heartbeat and disconnect. Does nothing if already closed.
    pub async fn close(&self) -> Result<()> {
        let heartbeat = self.heartbeat.lock().take();
        if let Some(heartbeat) = heartbeat {
            heartbeat.stop().await;
        }
        if !self.transport.is_connected() {
            return Ok(());
        }
        self.transport.disconnect().await?;
        info!("disconnected from droid");
        Ok(())
    }

    /// Write an already built frame.
    pub async fn send_frame(&self, frame: &CommandFrame) -> Result<()> {
        if !self.transport.is_connected() {
            return Err(LinkError::NotConnected);
        }
        let bytes = frame.encode()?;
        debug!(command_id = frame.command_id, frame = %hex::encode(&bytes), "send");
        self.transport.write(WriteTarget::Command, &bytes).await
    }

    /// Validate, encode and write a command.
    pub async fn send_command(&self, command: &Command) -> Result<()> {
        let frame = command.to_frame()?;
        self.send_frame(&frame).await
    }

    /// Send a multipurpose sub-command.
    pub async fn send_multipurpose(&self, sub_command: u8, data: &[u8]) -> Result<()> {
        self.send_command(&Command::Multipurpose {
            sub_command,
            data: data.to_vec(),
        })
        .await
    }

    /// Send `command` and wait for the notification carrying `response_id`.
    pub async fn request(&self, command: &Command, response_id: u8) -> Result<Vec<u8>> {
        let frame = command.to_frame()?;
        let handle = self.router.register_wait(response_id);
        if let Err(e) = self.send_frame(&frame).await {
            self.router.cancel(handle);
            return Err(e);
        }
        self.router
            .await_response(handle, self.config.response_timeout())
            .await
    }

    /// Ask the droid for its firmware information block.
    pub async fn firmware_information(&self) -> Result<Vec<u8>> {
        self.request(&Command::RetrieveFirmwareInformation, NOTIFY_FIRMWARE_INFO_RESPONSE)
            .await
    }

    /// Run a script. Script 0 and the full throttle test are refused.
    pub async fn execute_script(&self, script_id: u8) -> Result<()> {
        let command = Command::execute_script(script_id)?;
        info!(script_id, "executing script");
        self.send_command(&command).await
    }

    /// Play the shutdown sound matching the droid's personality.
    pub async fn play_shutdown_sound(&self) -> Result<()> {
        for command in shutdown_audio_commands(self.identity.personality_id) {
            self.send_command(&command).await?;
        }
        Ok(())
    }

    /// Set the audio volume.
    pub async fn set_volume(&self, volume: u8) -> Result<()> {
        self.send_command(&Command::Audio {
            command: AUDIO_SET_VOLUME,
            argument: volume,
        })
        .await
    }
}

#[async_trait]
impl ReactionHandler for DroidConnection {
    async fn react(&self, script_id: u8) -> Result<()> {
        self.execute_script(script_id).await
    }
}

impl std::fmt::Debug for DroidConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DroidConnection")
            .field("identity", &self.identity)
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

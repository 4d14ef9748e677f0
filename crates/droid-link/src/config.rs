//! Link configuration.
//!
//! All timing knobs of the link live here. The defaults match the behaviour
//! of the droid app: a heartbeat every 10 s, one second to answer a request,
//! and park reactions no more often than once a minute.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LinkError, Result};

/// Configuration for a droid link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Seconds between heartbeat commands.
    pub heartbeat_interval_secs: u64,

    /// How long a request waits for its response (milliseconds).
    pub response_timeout_ms: u64,

    /// Pause after a reaction before the next scan batch is processed.
    pub reaction_cooldown_secs: u64,

    /// Lower bound on the time between two reactions to the same beacon.
    pub min_reaction_window_secs: u64,

    /// The beacon's reaction interval is multiplied by this to get its
    /// window (in seconds), unless the result is below the lower bound.
    pub reaction_interval_multiplier: u64,

    /// Capacity of the channel carrying raw notifications.
    pub notification_queue_depth: usize,

    /// Run the pairing sequence script after connecting.
    pub play_pairing_sequence: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            heartbeat_interval_secs: 10,
            response_timeout_ms: 1000,
            reaction_cooldown_secs: 5,
            min_reaction_window_secs: 60,
            reaction_interval_multiplier: 5,
            notification_queue_depth: 64,
            play_pairing_sequence: false,
        }
    }
}

impl LinkConfig {
    /// Parse a configuration from YAML. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: LinkConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Reject values that would stall the link.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval_secs == 0 {
            return Err(LinkError::config("heartbeat_interval_secs must be positive"));
        }
        if self.response_timeout_ms == 0 {
            return Err(LinkError::config("response_timeout_ms must be positive"));
        }
        if self.notification_queue_depth == 0 {
            return Err(LinkError::config("notification_queue_depth must be positive"));
        }
        Ok(())
    }

    /// Set the heartbeat interval.
    pub fn with_heartbeat_interval_secs(mut self, secs: u64) -> Self {
        self.heartbeat_interval_secs = secs;
        self
    }

    /// Set the response timeout.
    pub fn with_response_timeout_ms(mut self, ms: u64) -> Self {
        self.response_timeout_ms = ms;
        self
    }

    /// Set the post-reaction cool-down.
    pub fn with_reaction_cooldown_secs(mut self, secs: u64) -> Self {
        self.reaction_cooldown_secs = secs;
        self
    }

    /// Set the minimum reaction window and the interval multiplier.
    pub fn with_reaction_window(mut self, min_secs: u64, multiplier: u64) -> Self {
        self.min_reaction_window_secs = min_secs;
        self.reaction_interval_multiplier = multiplier;
        self
    }

    /// Enable or disable the pairing sequence on connect.
    pub fn with_pairing_sequence(mut self, enabled: bool) -> Self {
        self.play_pairing_sequence = enabled;
        self
    }

    /// Heartbeat interval as a duration.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Response timeout as a duration.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Cool-down as a duration.
    pub fn reaction_cooldown(&self) -> Duration {
        Duration::from_secs(self.reaction_cooldown_secs)
    }

    /// Time that must pass between two reactions to a beacon advertising
    /// `reaction_interval`.
    pub fn reaction_window(&self, reaction_interval: u8) -> Duration {
        let scaled = u64::from(reaction_interval) * self.reaction_interval_multiplier;
        Duration::from_secs(scaled.max(self.min_reaction_window_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(10));
        assert_eq!(config.response_timeout(), Duration::from_millis(1000));
        assert_eq!(config.reaction_cooldown(), Duration::from_secs(5));
        assert!(!config.play_pairing_sequence);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reaction_window() {
        let config = LinkConfig::default();
        assert_eq!(config.reaction_window(0), Duration::from_secs(60));
        assert_eq!(config.reaction_window(1), Duration::from_secs(60));
        assert_eq!(config.reaction_window(12), Duration::from_secs(60));
        assert_eq!(config.reaction_window(13), Duration::from_secs(65));
        assert_eq!(config.reaction_window(255), Duration::from_secs(1275));
    }

    #[test]
    fn test_yaml_partial() {
        let config = LinkConfig::from_yaml_str(
            "heartbeat_interval_secs: 3\nplay_pairing_sequence: true\n",
        )
        .unwrap();
        assert_eq!(config.heartbeat_interval_secs, 3);
        assert!(config.play_pairing_sequence);
        assert_eq!(config.response_timeout_ms, 1000);
    }

    #[test]
    fn test_yaml_rejects_zero_timeout() {
        let err = LinkConfig::from_yaml_str("response_timeout_ms: 0\n").unwrap_err();
        assert!(matches!(err, LinkError::Config(_)));
    }

    #[test]
    fn test_builder() {
        let config = LinkConfig::default()
            .with_heartbeat_interval_secs(2)
            .with_response_timeout_ms(250)
            .with_reaction_cooldown_secs(0)
            .with_reaction_window(30, 2)
            .with_pairing_sequence(true);
        assert_eq!(config.reaction_window(20), Duration::from_secs(40));
        assert_eq!(config.reaction_window(5), Duration::from_secs(30));
        assert_eq!(config.response_timeout(), Duration::from_millis(250));
        assert!(config.play_pairing_sequence);
    }
}

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Heartbeat watchdog settings for the distribution plane.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    /// Seconds between watchdog scans; also the cadence at which
    /// subscribers send heartbeats.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,

    /// Seconds of silence after which a subscriber is evicted.
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: default_heartbeat_interval(),
            heartbeat_timeout: default_heartbeat_timeout(),
        }
    }
}

impl MonitoringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval == 0 {
            return Err(Error::Config(ConfigError::Message(
                "monitoring.heartbeat_interval cannot be 0".into(),
            )));
        }
        if self.heartbeat_timeout <= self.heartbeat_interval {
            return Err(Error::Config(ConfigError::Message(format!(
                "monitoring.heartbeat_timeout ({}) must exceed heartbeat_interval ({})",
                self.heartbeat_timeout, self.heartbeat_interval
            ))));
        }
        Ok(())
    }
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_heartbeat_timeout() -> u64 {
    90
}

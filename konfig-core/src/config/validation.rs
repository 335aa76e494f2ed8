use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::VALIDATOR_TIMEOUT_SECS;
use crate::Error;
use crate::Result;

/// Validation limits and the collaborator endpoint the write path calls.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationConfig {
    /// Upper bound on uploaded content, in bytes.
    #[serde(default = "default_max_config_size")]
    pub max_config_size: usize,

    /// Deadline for calls into the validation service.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Cache validation verdicts in redis keyed by content hash.
    #[serde(default = "default_enable_caching")]
    pub enable_caching: bool,

    /// Treat rule warnings as errors.
    #[serde(default)]
    pub strict_mode: bool,

    /// Endpoint of the validation collaborator.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_config_size: default_max_config_size(),
            timeout_seconds: default_timeout_seconds(),
            enable_caching: default_enable_caching(),
            strict_mode: false,
            endpoint: default_endpoint(),
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_config_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "validation.max_config_size cannot be 0".into(),
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::Config(ConfigError::Message(
                "validation.timeout_seconds cannot be 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_max_config_size() -> usize {
    1024 * 1024
}

fn default_timeout_seconds() -> u64 {
    VALIDATOR_TIMEOUT_SECS
}

fn default_enable_caching() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8083".to_string()
}

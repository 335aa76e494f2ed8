use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Listen settings for a gRPC server.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// TCP port the server binds on 0.0.0.0.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Soft cap on concurrently connected subscribers; 0 disables the cap.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            max_connections: default_max_connections(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config(ConfigError::Message(
                "server.port cannot be 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    1000
}

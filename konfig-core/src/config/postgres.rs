use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Relational store connection parameters.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PostgresConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Seconds before giving up on the initial connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            user: default_user(),
            password: default_password(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl PostgresConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "postgres.host cannot be empty".into(),
            )));
        }
        if self.database.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "postgres.database cannot be empty".into(),
            )));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "postgres".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_database() -> String {
    "configservice".to_string()
}

fn default_user() -> String {
    "configuser".to_string()
}

fn default_password() -> String {
    "configpass".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

//! Configuration loading for the konfig services.
//!
//! Provides hierarchical configuration with:
//! - Default values as code base
//! - Optional YAML file (the servers' single positional argument)
//! - Environment variable overrides (highest priority)
mod kafka;
mod monitoring;
mod postgres;
mod redis;
mod server;
mod statsd;
mod validation;

pub use kafka::*;
pub use monitoring::*;
pub use postgres::*;
pub use redis::*;
pub use server::*;
pub use statsd::*;
pub use validation::*;

#[cfg(test)]
mod config_test;

//---
use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Main configuration container shared by all three servers.
///
/// Sources are merged in the following order (later sources override
/// earlier ones):
/// 1. Type defaults (lowest priority)
/// 2. Optional configuration file
/// 3. Environment variables with the `KONFIG__` prefix (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct KonfigConfig {
    /// Listen settings for the local gRPC server
    pub server: ServerConfig,
    /// Relational store connection parameters
    pub postgres: PostgresConfig,
    /// Read-through cache connection parameters
    pub redis: RedisConfig,
    /// Event topic producer parameters
    pub kafka: KafkaConfig,
    /// Metrics sink parameters
    pub statsd: StatsdConfig,
    /// Heartbeat watchdog settings
    pub monitoring: MonitoringConfig,
    /// Validation limits and collaborator endpoint
    pub validation: ValidationConfig,
}

impl KonfigConfig {
    /// Loads configuration, optionally layering a YAML file over the
    /// defaults.
    ///
    /// # Example
    /// ```ignore
    /// // Defaults + environment only
    /// let cfg = KonfigConfig::load(None)?;
    ///
    /// // Layer a service-specific file
    /// let cfg = KonfigConfig::load(Some("config/distribution-service.yml"))?;
    /// ```
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("KONFIG")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-component configuration rules.
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.postgres.validate()?;
        self.kafka.validate()?;
        self.monitoring.validate()?;
        self.validation.validate()?;
        Ok(())
    }
}

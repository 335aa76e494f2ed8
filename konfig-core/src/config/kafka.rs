use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Event topic producer parameters.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KafkaConfig {
    #[serde(default = "default_brokers")]
    pub brokers: Vec<String>,

    #[serde(default = "default_topic")]
    pub topic: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            topic: default_topic(),
        }
    }
}

impl KafkaConfig {
    pub fn broker_list(&self) -> String {
        self.brokers.join(",")
    }

    pub fn validate(&self) -> Result<()> {
        if self.brokers.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "kafka.brokers cannot be empty".into(),
            )));
        }
        Ok(())
    }
}

fn default_brokers() -> Vec<String> {
    vec!["kafka:9092".to_string()]
}

fn default_topic() -> String {
    "config.updates".to_string()
}

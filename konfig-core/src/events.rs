//! Best-effort event emission to the bus.
//!
//! Records are opaque JSON; a failed publish is logged and forgotten. The
//! only hard guarantee is the bounded flush at shutdown.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::producer::Producer;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::config::KafkaConfig;
use crate::constants::EVENT_FLUSH_TIMEOUT_SECS;
use crate::time::unix_timestamp;
use crate::EventError;

/// One record on the event topic.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub event_type: String,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<String>,
    pub timestamp: i64,
}

impl Event {
    pub fn new(
        event_type: &str,
        service_name: &str,
    ) -> Self {
        Self {
            event_type: event_type.to_string(),
            service_name: service_name.to_string(),
            instance_id: None,
            version: None,
            performed_by: None,
            timestamp: unix_timestamp(),
        }
    }

    pub fn instance(
        mut self,
        instance_id: &str,
    ) -> Self {
        self.instance_id = Some(instance_id.to_string());
        self
    }

    pub fn version(
        mut self,
        version: i64,
    ) -> Self {
        self.version = Some(version);
        self
    }

    pub fn performed_by(
        mut self,
        performed_by: &str,
    ) -> Self {
        self.performed_by = Some(performed_by.to_string());
        self
    }
}

#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(
        &self,
        event: Event,
    ) -> Result<(), EventError>;
}

/// Publishes and absorbs the failure, which is the policy at every call
/// site outside shutdown.
pub async fn emit(
    sink: &dyn EventSink,
    event: Event,
) {
    let event_type = event.event_type.clone();
    if let Err(e) = sink.publish(event).await {
        warn!(event_type = %event_type, error = %e, "event publish failed");
    }
}

/// Stand-in used when the bus is down at startup; events are dropped.
pub struct NoopEvents;

#[async_trait]
impl EventSink for NoopEvents {
    async fn publish(
        &self,
        _event: Event,
    ) -> Result<(), EventError> {
        Ok(())
    }
}

/// Kafka-backed event sink.
pub struct KafkaEvents {
    producer: FutureProducer,
    topic: String,
}

impl KafkaEvents {
    pub fn new(config: &KafkaConfig) -> Result<Self, EventError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.broker_list())
            .set("message.timeout.ms", "5000")
            .create()?;

        info!(brokers = %config.broker_list(), topic = %config.topic, "event producer created");

        Ok(Self {
            producer,
            topic: config.topic.clone(),
        })
    }

    /// Drains in-flight records with a bounded wait. Called once at
    /// shutdown.
    pub fn flush(&self) {
        if let Err(e) = self
            .producer
            .flush(Duration::from_secs(EVENT_FLUSH_TIMEOUT_SECS))
        {
            warn!(error = %e, "event producer flush failed");
        }
    }
}

#[async_trait]
impl EventSink for KafkaEvents {
    async fn publish(
        &self,
        event: Event,
    ) -> Result<(), EventError> {
        let payload = serde_json::to_vec(&event)?;
        let record = FutureRecord::<(), _>::to(&self.topic).payload(&payload);

        // Enqueue only; delivery is the broker's problem. The delivery
        // future is dropped on purpose.
        match self.producer.send_result(record) {
            Ok(_) => Ok(()),
            Err((e, _)) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod events_test;

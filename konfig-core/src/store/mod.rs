//! Typed access to the relational store.
//!
//! The store owns every persisted entity: versioned documents, rollouts,
//! the instance registry, the audit trail, and the validation schema/rule
//! tables. Everything else in the system treats it as the single source of
//! truth.

mod postgres;

pub use postgres::PostgresStore;

#[cfg(test)]
mod store_test;

//---
use async_trait::async_trait;

use crate::StoreError;
use konfig_proto::common::ConfigDocument;
use konfig_proto::common::ConfigMetadata;
use konfig_proto::common::RolloutState;
use konfig_proto::common::RolloutStrategy;
use konfig_proto::common::ServiceInstance;
use konfig_proto::validation::SchemaInfo;

/// Persisted liveness state of a subscriber instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    Connected,
    Disconnected,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Connected => "connected",
            InstanceStatus::Disconnected => "disconnected",
        }
    }
}

/// A per-service validation rule row.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    pub rule_type: RuleType,
    pub field: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    /// The field must be present.
    Required,
    /// The field must be numeric and within `[min_value, max_value]`.
    Range,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Required => "required",
            RuleType::Range => "range",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "required" => Some(RuleType::Required),
            "range" => Some(RuleType::Range),
            _ => None,
        }
    }
}

#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Writes metadata and content in one transaction. Fails with
    /// [`StoreError::Conflict`] when `(service_name, version)` exists.
    async fn insert_config(
        &self,
        doc: &ConfigDocument,
        description: &str,
    ) -> Result<String, StoreError>;

    /// `max(existing version) + 1`, starting at 1. The unique index on
    /// `(service_name, version)` is the backstop for concurrent writers:
    /// losers of the race surface as [`StoreError::Conflict`] on insert.
    async fn next_version(
        &self,
        service_name: &str,
    ) -> Result<i64, StoreError>;

    /// Empty sentinel (`version == 0`) when absent.
    async fn get_by_id(
        &self,
        config_id: &str,
    ) -> Result<ConfigDocument, StoreError>;

    /// Highest version for a service, or the empty sentinel.
    async fn get_latest(
        &self,
        service_name: &str,
    ) -> Result<ConfigDocument, StoreError>;

    async fn get_by_version(
        &self,
        service_name: &str,
        version: i64,
    ) -> Result<ConfigDocument, StoreError>;

    /// Page of metadata plus the unpaged total. An empty `service_name`
    /// lists across all services ordered by `(service_name, version desc)`.
    async fn list_metadata(
        &self,
        service_name: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ConfigMetadata>, i64), StoreError>;

    /// `true` when a row was removed; content cascades.
    async fn delete_by_id(
        &self,
        config_id: &str,
    ) -> Result<bool, StoreError>;

    /// Creates or restarts the one rollout row per config. Returns the
    /// rollout id.
    async fn upsert_rollout(
        &self,
        config_id: &str,
        strategy: RolloutStrategy,
        target_percentage: i32,
    ) -> Result<String, StoreError>;

    /// PENDING sentinel when no rollout was ever started.
    async fn get_rollout_state(
        &self,
        config_id: &str,
    ) -> Result<RolloutState, StoreError>;

    async fn list_instances(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>, StoreError>;

    /// Upsert on `(service_name, instance_id)`; refreshes `last_heartbeat`.
    async fn update_instance_status(
        &self,
        service_name: &str,
        instance_id: &str,
        version: i64,
        status: InstanceStatus,
    ) -> Result<(), StoreError>;

    /// Audit row for a delivered version.
    async fn record_delivery(
        &self,
        service_name: &str,
        instance_id: &str,
        version: i64,
    ) -> Result<(), StoreError>;

    async fn append_audit(
        &self,
        service_name: &str,
        config_id: &str,
        action: &str,
        performed_by: &str,
        details: &str,
    ) -> Result<(), StoreError>;

    async fn upsert_schema(
        &self,
        service_name: &str,
        schema: &[u8],
        description: &str,
    ) -> Result<String, StoreError>;

    async fn get_schema(
        &self,
        service_name: &str,
    ) -> Result<Option<SchemaInfo>, StoreError>;

    async fn list_schemas(&self) -> Result<Vec<SchemaInfo>, StoreError>;

    async fn list_rules(
        &self,
        service_name: &str,
    ) -> Result<Vec<ValidationRule>, StoreError>;

    async fn record_validation(
        &self,
        service_name: &str,
        content_hash: &str,
        valid: bool,
    ) -> Result<(), StoreError>;
}

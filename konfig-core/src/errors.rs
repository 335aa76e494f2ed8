//! Error hierarchy for the configuration plane.
//!
//! Domain errors are grouped per collaborator so the call sites can decide
//! which failures are fatal (store at write time) and which are absorbed
//! (cache, events, metrics).

use std::time::Duration;

use config::ConfigError;
use konfig_proto::validation::ValidationIssue;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input was missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown config id or version.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration loading or validation failures.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Relational store failures.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Key/value cache failures. Callers treat these as misses.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Event bus failures. Callers log and continue.
    #[error(transparent)]
    Events(#[from] EventError),

    /// The syntactic or schema check rejected the document.
    #[error("Validation rejected: {} issue(s)", .0.len())]
    ValidationRejected(Vec<ValidationIssue>),

    /// Transport-level failures talking to a collaborator.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Unrecoverable failures requiring process termination.
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Duplicate `(service_name, version)` insert.
    #[error("Version conflict: {service_name} v{version} already exists")]
    Conflict { service_name: String, version: i64 },

    /// Connection lost or never established.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Anything else the driver reports.
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Event producer unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Invalid URI format: {0}")]
    InvalidUri(String),

    #[error("Socket connect failed: {0}")]
    ConnectError(String),

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Status(#[from] Box<tonic::Status>),

    #[error(transparent)]
    Transport(#[from] Box<tonic::transport::Error>),
}

impl Error {
    /// Single-issue validation rejection.
    pub fn rejected(
        field: &str,
        error_type: &str,
        message: impl Into<String>,
    ) -> Self {
        Error::ValidationRejected(vec![ValidationIssue {
            field: field.to_string(),
            error_type: error_type.to_string(),
            message: message.into(),
        }])
    }
}

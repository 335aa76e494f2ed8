//! Protocol-level constants shared across the workspace.

/// Hard cap on gRPC message size in both directions.
pub const MAX_MESSAGE_SIZE_BYTES: usize = 4 * 1024 * 1024;

/// Deadline for calls into the validation collaborator.
pub const VALIDATOR_TIMEOUT_SECS: u64 = 10;

/// Bound on the event producer flush at shutdown.
pub const EVENT_FLUSH_TIMEOUT_SECS: u64 = 10;

/// Default page size for config listings.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Event types written to the event topic.
pub mod event_types {
    pub const CONFIG_UPLOADED: &str = "config.uploaded";
    pub const CONFIG_DELETED: &str = "config.deleted";
    pub const CONFIG_ROLLED_BACK: &str = "config.rolled_back";
    pub const CONFIG_ROLLOUT_STARTED: &str = "config.rollout_started";
    pub const CONFIG_UPDATE: &str = "config_update";
    pub const CLIENT_CONNECT: &str = "client_connect";
    pub const CLIENT_DISCONNECT: &str = "client_disconnect";
}

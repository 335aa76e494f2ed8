//! # konfig - Configuration Management Plane
//!
//! Versioned configuration for microservice fleets: operators upload
//! documents through the control-plane API, running instances subscribe to
//! the distribution plane and receive every new version over a long-lived
//! stream, with an on-disk fallback so applications always boot against a
//! value.
//!
//! ## Quick Start
//!
//! ### Subscribing (application side)
//!
//! ```rust,ignore
//! use konfig::client::ClientBuilder;
//!
//! let client = ClientBuilder::new("http://localhost:8082", "payments").build();
//! client.on_config_update(|doc| {
//!     println!("now on config v{}", doc.version);
//! });
//! client.start()?;
//! ```
//!
//! ### Serving
//!
//! The three server binaries live in `konfig-server`: `konfig-api`
//! (control plane), `konfig-distribution` (streaming fan-out), and
//! `konfig-validation` (schema/rule checks). Each takes an optional YAML
//! config file as its only argument.
//!
//! ## Crate Organization
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | **`konfig`** | Unified API (this crate) |
//! | `konfig-server` | Server runtimes |
//! | `konfig-client` | Subscriber SDK |
//! | `konfig-core` | Shared runtime and collaborator adapters |
//! | `konfig-proto` | Protocol definitions |
//!
//! ## Features
//!
//! - `client` (default) - subscriber SDK re-exports
//! - `server` (default) - server runtime re-exports

/// Protocol definitions shared by every component.
pub mod proto {
    pub use konfig_proto::api;
    pub use konfig_proto::common;
    pub use konfig_proto::distribution;
    pub use konfig_proto::validation;
}

/// Shared configuration and error types.
pub mod core {
    pub use konfig_core::Error;
    pub use konfig_core::KonfigConfig;
    pub use konfig_core::Result;
}

/// Subscriber SDK.
#[cfg(feature = "client")]
pub mod client {
    pub use konfig_client::ClientBuilder;
    pub use konfig_client::ClientError;
    pub use konfig_client::ConfigClient;
    pub use konfig_client::DiskCache;
}

/// Server runtimes.
#[cfg(feature = "server")]
pub mod server {
    pub use konfig_server::api::ApiService;
    pub use konfig_server::distribution::spawn_watchdog;
    pub use konfig_server::distribution::DistributionEngine;
    pub use konfig_server::validation::ValidationEngine;
}

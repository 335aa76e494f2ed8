//! Subscriber SDK for the konfig distribution plane.
//!
//! The client keeps a bidirectional stream to the distribution service
//! alive across reconnects, persists every received version to a per-service
//! disk cache, and guarantees the application sees a value before the
//! network is up.
//!
//! ```ignore
//! let client = ClientBuilder::new("http://localhost:8082", "payments").build();
//! client.on_config_update(|doc| println!("config v{}", doc.version));
//! client.start()?;
//! ```

mod builder;
mod client;
mod disk_cache;
mod error;

pub use builder::ClientBuilder;
pub use client::ConfigClient;
pub use disk_cache::DiskCache;
pub use error::ClientError;
pub use error::Result;

#[cfg(test)]
mod client_test;
#[cfg(test)]
mod disk_cache_test;

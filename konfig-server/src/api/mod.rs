//! The control-plane write path: upload, list, get, delete, rollout
//! start, and semantic rollback.

mod service;

pub use service::ApiService;

#[cfg(test)]
mod service_test;

//! The validation collaborator: syntactic checks plus per-service rules
//! loaded from the store, with optional verdict caching.

mod rules;
mod service;

pub use service::ValidationEngine;

#[cfg(test)]
mod rules_test;

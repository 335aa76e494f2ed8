//! # konfig-proto
//!
//! gRPC protocol definitions for konfig - foundation for all client implementations
//!
//! ## When to use this crate
//!
//! - ✅ Building Go/Python/Java clients
//! - ✅ Need raw `.proto` files for code generation
//! - ✅ Custom protocol extensions
//!
//! ## For Rust users
//!
//! If you're writing Rust code, use the `konfig` facade crate (or
//! `konfig-client` / `konfig-server` directly) instead - they provide
//! higher-level APIs on top of these protocol definitions.
//!
//! ## Protocol Modules
//!
//! This crate provides protobuf-generated Rust types organized by service area:
//! shared messages in [`common`], the control plane in [`api`], the streaming
//! data plane in [`distribution`], and the validation collaborator in
//! [`validation`].

pub mod common {
    include!("generated/konfig.common.rs");
}

pub mod api {
    include!("generated/konfig.api.rs");
}

pub mod distribution {
    include!("generated/konfig.distribution.rs");
}

pub mod validation {
    include!("generated/konfig.validation.rs");
}

pub mod exts;

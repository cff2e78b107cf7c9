//! MTL Protocol Buffers
//!
//! Generated protobuf code for the MTL gRPC API.
//!
//! This crate contains:
//! - `UserService` for accounts and credential checks
//! - `ConfigurationService` for per-user agent settings
//! - `AgentService` for the duplex agent conversation

#![allow(clippy::derive_partial_eq_without_eq)]

/// MTL v1 API definitions.
///
/// All generated types and services are included here.
pub mod v1 {
    tonic::include_proto!("mtl.v1");
}

// Re-export v1 as the default API version for convenience
pub use v1::*;

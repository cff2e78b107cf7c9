//! MTL Configuration Service Library
//!
//! - `SQLite` storage for one configuration record per user
//! - AES-256-GCM encryption of secret fields at rest
//! - `ConfigurationService` gRPC implementation

pub mod cipher;
pub mod server;
pub mod storage;

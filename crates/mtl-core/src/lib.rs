//! MTL Core Library
//!
//! Shared functionality for MTL services:
//! - Gateway configuration resolution
//! - JWT issuance and validation
//! - `SQLite` pool helpers and migrations
//! - Common error types

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};

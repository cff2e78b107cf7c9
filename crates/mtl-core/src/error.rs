//! Error types for MTL core library.

use thiserror::Error;

/// Result type alias using MTL Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for MTL operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings file missing, unreadable or malformed.
    #[error("Configuration error: {0}")]
    Config(String),
}

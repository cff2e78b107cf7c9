//! Relay error types.

use std::time::Duration;

/// Errors that can occur while relaying a session.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// No caller identity. The agent stream is never opened.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Failed to open agent stream: {0}")]
    StreamOpen(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed client frame. The frame is dropped and relaying continues.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Session exceeded its {}s deadline", .0.as_secs())]
    Timeout(Duration),
}

/// Human-readable text for a backend status. Falls back to the code's
/// description when the backend sent no message.
pub fn status_text(status: &tonic::Status) -> String {
    if status.message().is_empty() {
        status.code().to_string()
    } else {
        status.message().to_string()
    }
}

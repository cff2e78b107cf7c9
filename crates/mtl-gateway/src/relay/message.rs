//! Client wire message.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::RelayError;
use super::kind;

/// JSON message exchanged with the client:
/// `{"type": "...", "content": "...", "metadata": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl ClientMessage {
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(kind::ERROR, content)
    }

    pub fn close() -> Self {
        Self::new(kind::CLOSE, String::new())
    }

    /// Parse one text frame.
    pub fn from_json(text: &str) -> Result<Self, RelayError> {
        serde_json::from_str(text).map_err(|e| RelayError::ProtocolViolation(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, RelayError> {
        serde_json::to_string(self).map_err(|e| RelayError::Transport(e.to_string()))
    }
}

//! Data models for configuration storage.

use serde::{Deserialize, Serialize};

/// A stored configuration row. `openai_key` is ciphertext and `agents` is
/// the JSON encoding of `Vec<AgentSettings>`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Configuration {
    pub id: String,
    pub user_id: String,
    pub openai_key: String,
    pub agents: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Configuration {
    /// Decode the agents column.
    pub fn agent_settings(&self) -> Result<Vec<AgentSettings>, serde_json::Error> {
        serde_json::from_str(&self.agents)
    }
}

/// Settings for one agent attached to a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AgentSettings {
    Calendar {
        /// Encrypted at rest.
        google_api_key: String,
        context: String,
    },
    Things {
        context: String,
    },
}

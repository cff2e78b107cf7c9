//! Database queries for the configuration service.

use mtl_core::db::{DatabaseError, unix_timestamp};

use super::db::ConfigurationDatabase;
use super::models::{AgentSettings, Configuration};

impl ConfigurationDatabase {
    /// Create an empty configuration for a user. A second configuration for
    /// the same user yields `DatabaseError::Conflict`.
    pub async fn create_configuration(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Configuration, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO configurations (id, user_id, openai_key, agents, created_at, updated_at) VALUES (?, ?, '', '[]', ?, ?)",
        )
        .bind(id)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_configuration(user_id).await
    }

    /// Get the configuration owned by a user.
    pub async fn get_configuration(&self, user_id: &str) -> Result<Configuration, DatabaseError> {
        sqlx::query_as::<_, Configuration>("SELECT * FROM configurations WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Configuration for user {user_id}")))
    }

    /// Replace the secret key and agent list of a user's configuration.
    pub async fn update_configuration(
        &self,
        user_id: &str,
        openai_key: &str,
        agents: &[AgentSettings],
    ) -> Result<Configuration, DatabaseError> {
        let agents_json =
            serde_json::to_string(agents).map_err(|e| DatabaseError::Query(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE configurations SET openai_key = ?, agents = ?, updated_at = ? WHERE user_id = ?",
        )
        .bind(openai_key)
        .bind(agents_json)
        .bind(unix_timestamp())
        .bind(user_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Configuration for user {user_id}"
            )));
        }

        self.get_configuration(user_id).await
    }

    /// Delete a user's configuration. Returns whether a row was removed.
    pub async fn delete_configuration(&self, user_id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM configurations WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

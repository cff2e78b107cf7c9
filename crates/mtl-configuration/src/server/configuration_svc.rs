//! `ConfigurationService` gRPC implementation.
//!
//! Secrets arrive and leave in plaintext; only ciphertext reaches storage.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{error, info, instrument, warn};

use mtl_core::db::DatabaseError;
use mtl_proto::v1::configuration_service_server::ConfigurationService;
use mtl_proto::v1::{
    CalendarConfig, CreateConfigurationRequest, CreateConfigurationResponse,
    DeleteConfigurationRequest, DeleteConfigurationResponse, GetConfigurationRequest,
    GetConfigurationResponse, ThingsConfig, UpdateConfigurationRequest,
    UpdateConfigurationResponse,
};

use crate::cipher::FieldCipher;
use crate::storage::{AgentSettings, ConfigurationDatabase};

pub struct ConfigurationServiceImpl {
    db: ConfigurationDatabase,
    cipher: Arc<FieldCipher>,
}

impl ConfigurationServiceImpl {
    pub const fn new(db: ConfigurationDatabase, cipher: Arc<FieldCipher>) -> Self {
        Self { db, cipher }
    }

    fn seal(&self, what: &str, plaintext: &str) -> Result<String, Status> {
        self.cipher.encrypt(plaintext).map_err(|e| {
            error!(error = %e, field = what, "Encryption failed");
            Status::internal(format!("Failed to encrypt {what}"))
        })
    }

    /// Split stored agent settings into the wire shape. An undecryptable
    /// Google key is returned empty rather than failing the whole read.
    fn agents_to_proto(
        &self,
        agents: Vec<AgentSettings>,
    ) -> (Option<CalendarConfig>, Option<ThingsConfig>) {
        let mut calendar = None;
        let mut things = None;
        for agent in agents {
            match agent {
                AgentSettings::Calendar {
                    google_api_key,
                    context,
                } => {
                    let google_api_key = self.cipher.decrypt(&google_api_key).unwrap_or_else(|e| {
                        warn!(error = %e, "Failed to decrypt Google API key");
                        String::new()
                    });
                    calendar = Some(CalendarConfig {
                        google_api_key,
                        context,
                    });
                }
                AgentSettings::Things { context } => {
                    things = Some(ThingsConfig { context });
                }
            }
        }
        (calendar, things)
    }

    fn proto_to_agents(
        &self,
        calendar: Option<CalendarConfig>,
        things: Option<ThingsConfig>,
    ) -> Result<Vec<AgentSettings>, Status> {
        let mut agents = Vec::with_capacity(2);
        if let Some(calendar) = calendar {
            agents.push(AgentSettings::Calendar {
                google_api_key: self.seal("Google API key", &calendar.google_api_key)?,
                context: calendar.context,
            });
        }
        if let Some(things) = things {
            agents.push(AgentSettings::Things {
                context: things.context,
            });
        }
        Ok(agents)
    }
}

fn require_user_id(user_id: &str) -> Result<(), Status> {
    if user_id.trim().is_empty() {
        return Err(Status::invalid_argument("user_id is required"));
    }
    Ok(())
}

fn db_status(e: DatabaseError) -> Status {
    match e {
        DatabaseError::NotFound(msg) => Status::not_found(msg),
        DatabaseError::Conflict(_) => {
            Status::already_exists("Configuration already exists for this user")
        }
        other => {
            error!(error = %other, "Configuration storage failure");
            Status::internal("Storage failure")
        }
    }
}

#[tonic::async_trait]
impl ConfigurationService for ConfigurationServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "CreateConfiguration"))]
    async fn create_configuration(
        &self,
        request: Request<CreateConfigurationRequest>,
    ) -> Result<Response<CreateConfigurationResponse>, Status> {
        let req = request.into_inner();
        require_user_id(&req.user_id)?;

        let config_id = uuid::Uuid::new_v4().to_string();
        self.db
            .create_configuration(&config_id, &req.user_id)
            .await
            .map_err(db_status)?;

        info!(config_id = %config_id, user_id = %req.user_id, "Configuration created");

        Ok(Response::new(CreateConfigurationResponse {
            config_id,
            message: "Configuration created successfully".to_string(),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "GetConfiguration"))]
    async fn get_configuration(
        &self,
        request: Request<GetConfigurationRequest>,
    ) -> Result<Response<GetConfigurationResponse>, Status> {
        let req = request.into_inner();
        require_user_id(&req.user_id)?;

        let config = self
            .db
            .get_configuration(&req.user_id)
            .await
            .map_err(db_status)?;

        let open_ai_key = self.cipher.decrypt(&config.openai_key).map_err(|e| {
            error!(error = %e, config_id = %config.id, "Failed to decrypt OpenAI key");
            Status::internal("Failed to decrypt API key")
        })?;

        let agents = config.agent_settings().map_err(|e| {
            error!(error = %e, config_id = %config.id, "Corrupt agents column");
            Status::internal("Stored configuration is corrupt")
        })?;
        let (calendar, things) = self.agents_to_proto(agents);

        Ok(Response::new(GetConfigurationResponse {
            config_id: config.id,
            user_id: config.user_id,
            open_ai_key,
            calendar,
            things,
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "UpdateConfiguration"))]
    async fn update_configuration(
        &self,
        request: Request<UpdateConfigurationRequest>,
    ) -> Result<Response<UpdateConfigurationResponse>, Status> {
        let req = request.into_inner();
        require_user_id(&req.user_id)?;

        let existing = self
            .db
            .get_configuration(&req.user_id)
            .await
            .map_err(db_status)?;
        if !req.config_id.is_empty() && req.config_id != existing.id {
            warn!(
                user_id = %req.user_id,
                config_id = %req.config_id,
                "Configuration id does not belong to user"
            );
            return Err(Status::invalid_argument(
                "config_id does not match the user's configuration",
            ));
        }

        let openai_key = self.seal("OpenAI key", &req.open_ai_key)?;
        let agents = self.proto_to_agents(req.calendar, req.things)?;

        self.db
            .update_configuration(&req.user_id, &openai_key, &agents)
            .await
            .map_err(db_status)?;

        info!(config_id = %existing.id, agents = agents.len(), "Configuration updated");

        Ok(Response::new(UpdateConfigurationResponse {
            success: true,
            message: "Configuration updated successfully".to_string(),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "DeleteConfiguration"))]
    async fn delete_configuration(
        &self,
        request: Request<DeleteConfigurationRequest>,
    ) -> Result<Response<DeleteConfigurationResponse>, Status> {
        let req = request.into_inner();
        require_user_id(&req.user_id)?;

        let deleted = self
            .db
            .delete_configuration(&req.user_id)
            .await
            .map_err(db_status)?;
        if !deleted {
            return Err(Status::not_found("Configuration not found"));
        }

        info!(user_id = %req.user_id, "Configuration deleted");

        Ok(Response::new(DeleteConfigurationResponse {
            success: true,
            message: "Configuration deleted successfully".to_string(),
        }))
    }
}

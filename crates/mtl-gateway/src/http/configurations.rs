//! `/api/v1/configurations` routes. The owner is always the caller.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use mtl_core::auth::Claims;
use mtl_proto::v1::{
    CalendarConfig, CreateConfigurationRequest, DeleteConfigurationRequest,
    GetConfigurationRequest, ThingsConfig, UpdateConfigurationRequest,
};

use super::AppState;
use super::auth::ensure_owner;
use super::error::ApiError;
use super::users::StatusResponse;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarSettings {
    #[serde(default)]
    pub google_api_key: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThingsSettings {
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateConfigurationResponse {
    pub config_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConfigurationBody {
    #[serde(default)]
    pub config_id: String,
    #[serde(default)]
    pub open_ai_key: String,
    pub calendar: Option<CalendarSettings>,
    pub things: Option<ThingsSettings>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigurationResponse {
    pub config_id: String,
    pub user_id: String,
    pub open_ai_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<CalendarSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub things: Option<ThingsSettings>,
}

/// `POST /api/v1/configurations`
pub async fn create_configuration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<(StatusCode, Json<CreateConfigurationResponse>), ApiError> {
    let response = state
        .clients
        .configurations
        .clone()
        .create_configuration(state.clients.request(CreateConfigurationRequest {
            user_id: claims.sub,
        }))
        .await?
        .into_inner();

    Ok((
        StatusCode::CREATED,
        Json(CreateConfigurationResponse {
            config_id: response.config_id,
            message: response.message,
        }),
    ))
}

/// `PUT /api/v1/configurations`
pub async fn update_configuration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<UpdateConfigurationBody>,
) -> Result<Json<StatusResponse>, ApiError> {
    let response = state
        .clients
        .configurations
        .clone()
        .update_configuration(state.clients.request(UpdateConfigurationRequest {
            config_id: body.config_id,
            user_id: claims.sub,
            open_ai_key: body.open_ai_key,
            calendar: body.calendar.map(|c| CalendarConfig {
                google_api_key: c.google_api_key,
                context: c.context,
            }),
            things: body.things.map(|t| ThingsConfig { context: t.context }),
        }))
        .await?
        .into_inner();

    Ok(Json(StatusResponse {
        success: response.success,
        message: response.message,
    }))
}

/// `GET /api/v1/configurations/{user_id}`
pub async fn get_configuration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    ensure_owner(&claims, &user_id)?;

    let config = state
        .clients
        .configurations
        .clone()
        .get_configuration(state.clients.request(GetConfigurationRequest { user_id }))
        .await?
        .into_inner();

    Ok(Json(ConfigurationResponse {
        config_id: config.config_id,
        user_id: config.user_id,
        open_ai_key: config.open_ai_key,
        calendar: config.calendar.map(|c| CalendarSettings {
            google_api_key: c.google_api_key,
            context: c.context,
        }),
        things: config.things.map(|t| ThingsSettings { context: t.context }),
    }))
}

/// `DELETE /api/v1/configurations/{user_id}`
pub async fn delete_configuration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    ensure_owner(&claims, &user_id)?;

    let response = state
        .clients
        .configurations
        .clone()
        .delete_configuration(state.clients.request(DeleteConfigurationRequest { user_id }))
        .await?
        .into_inner();

    Ok(Json(StatusResponse {
        success: response.success,
        message: response.message,
    }))
}

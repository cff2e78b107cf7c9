//! `/api/v1/agents` routes: the websocket relay and one-shot messages.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mtl_core::auth::Claims;
use mtl_proto::v1::SendAgentMessageRequest;

use super::AppState;
use super::error::ApiError;
use crate::relay::{RelayError, RelaySession, websocket};

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub config_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub message: String,
}

/// `GET /api/v1/agents/stream?config_id=...` (websocket upgrade)
pub async fn stream(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<StreamParams>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(config_id) = params.config_id.filter(|c| !c.trim().is_empty()) else {
        return ApiError::BadRequest("config_id is required".into()).into_response();
    };

    let session = match RelaySession::authorize(
        Some(&claims),
        config_id,
        state.session_timeout,
    ) {
        Ok(session) => session.with_teardown_grace(state.teardown_grace),
        Err(e) => return ApiError::Unauthorized(e.to_string()).into_response(),
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let connector = Arc::clone(&state.connector);
    ws.on_upgrade(move |socket| async move {
        let (sender, receiver) = websocket::split(socket);
        match session.run(connector.as_ref(), receiver, sender).await {
            Ok(reason) => info!(reason = %reason, "Websocket relay finished"),
            Err(RelayError::StreamOpen(e)) => warn!(error = %e, "Websocket relay never started"),
            Err(e) => warn!(error = %e, "Websocket relay failed"),
        }
    })
}

/// `POST /api/v1/agents/message`
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is required".into()));
    }

    let response = state
        .clients
        .agents
        .clone()
        .send_agent_message(state.clients.request(SendAgentMessageRequest {
            user_id: claims.sub,
            message: body.message,
        }))
        .await?
        .into_inner();

    Ok(Json(SendMessageResponse {
        message: response.message,
    }))
}

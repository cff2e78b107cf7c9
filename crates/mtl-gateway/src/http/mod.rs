//! HTTP surface of the gateway.

pub mod agents;
pub mod auth;
pub mod configurations;
pub mod error;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use mtl_core::auth::JwtManager;

use crate::clients::BackendClients;
use crate::relay::AgentConnector;

pub use error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtManager>,
    pub clients: BackendClients,
    pub connector: Arc<dyn AgentConnector>,
    pub session_timeout: Duration,
    /// Bound on relay teardown work.
    pub teardown_grace: Duration,
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/v1/users/{user_id}",
            get(users::get_user).delete(users::delete_user),
        )
        .route(
            "/api/v1/configurations",
            post(configurations::create_configuration).put(configurations::update_configuration),
        )
        .route(
            "/api/v1/configurations/{user_id}",
            get(configurations::get_configuration).delete(configurations::delete_configuration),
        )
        .route("/api/v1/agents/stream", get(agents::stream))
        .route("/api/v1/agents/message", post(agents::send_message))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/users/sign-up", post(users::sign_up))
        .route("/api/v1/users/sign-in", post(users::sign_in))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `GET /health`
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

//! Bearer token authentication for protected routes.

use axum::extract::{Query, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;
use tracing::debug;

use mtl_core::auth::Claims;

use super::AppState;
use super::error::ApiError;

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Validate the access token and stash its [`Claims`] in the request
/// extensions. The token comes from `Authorization: Bearer` or, for
/// websocket upgrades from browsers, the `token` query parameter.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .or_else(|| {
            Query::<TokenQuery>::try_from_uri(request.uri())
                .ok()
                .and_then(|Query(q)| q.token)
        })
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing access token".into()))?;

    let claims = state.jwt.validate(&token).map_err(|e| {
        debug!(error = %e, "Rejected access token");
        ApiError::Unauthorized("Invalid access token".into())
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Reject access to another user's resources.
pub fn ensure_owner(claims: &Claims, user_id: &str) -> Result<(), ApiError> {
    if claims.sub == user_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Cannot access another user's resources".into(),
        ))
    }
}

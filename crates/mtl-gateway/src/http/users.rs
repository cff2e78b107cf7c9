//! `/api/v1/users` routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use mtl_core::auth::Claims;
use mtl_proto::v1::{AuthUserRequest, CreateUserRequest, DeleteUserRequest, GetUserRequest};

use super::AppState;
use super::auth::ensure_owner;
use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SignUpBody {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

/// `POST /api/v1/users/sign-up`
pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpBody>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    let response = state
        .clients
        .users
        .clone()
        .create_user(state.clients.request(CreateUserRequest {
            username: body.username,
            email: body.email,
            password: body.password,
        }))
        .await?
        .into_inner();

    info!(user_id = %response.user_id, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            user_id: response.user_id,
        }),
    ))
}

/// `POST /api/v1/users/sign-in`
pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInBody>,
) -> Result<Json<SignInResponse>, ApiError> {
    let response = state
        .clients
        .users
        .clone()
        .auth_user(state.clients.request(AuthUserRequest {
            email: body.email,
            password: body.password,
        }))
        .await?
        .into_inner();

    Ok(Json(SignInResponse {
        token: response.token,
    }))
}

/// `GET /api/v1/users/{user_id}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .clients
        .users
        .clone()
        .get_user(state.clients.request(GetUserRequest { user_id }))
        .await?
        .into_inner();

    Ok(Json(UserResponse {
        user_id: user.user_id,
        username: user.username,
        email: user.email,
    }))
}

/// `DELETE /api/v1/users/{user_id}`
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    ensure_owner(&claims, &user_id)?;

    let response = state
        .clients
        .users
        .clone()
        .delete_user(state.clients.request(DeleteUserRequest { user_id }))
        .await?
        .into_inner();

    Ok(Json(StatusResponse {
        success: response.success,
        message: response.message,
    }))
}

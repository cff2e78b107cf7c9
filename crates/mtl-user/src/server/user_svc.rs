//! `UserService` gRPC implementation.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{error, info, instrument, warn};

use mtl_core::auth::JwtManager;
use mtl_core::db::DatabaseError;
use mtl_proto::v1::user_service_server::UserService;
use mtl_proto::v1::{
    AuthUserRequest, AuthUserResponse, CreateUserRequest, CreateUserResponse, DeleteUserRequest,
    DeleteUserResponse, GetUserRequest, GetUserResponse,
};

use crate::password;
use crate::storage::UserDatabase;

pub struct UserServiceImpl {
    db: UserDatabase,
    jwt: Arc<JwtManager>,
}

impl UserServiceImpl {
    pub const fn new(db: UserDatabase, jwt: Arc<JwtManager>) -> Self {
        Self { db, jwt }
    }
}

fn require(field: &str, value: &str) -> Result<(), Status> {
    if value.trim().is_empty() {
        return Err(Status::invalid_argument(format!("{field} is required")));
    }
    Ok(())
}

fn db_status(e: DatabaseError) -> Status {
    match e {
        DatabaseError::NotFound(msg) => Status::not_found(msg),
        DatabaseError::Conflict(msg) => Status::already_exists(msg),
        other => {
            error!(error = %other, "User storage failure");
            Status::internal("Storage failure")
        }
    }
}

#[tonic::async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "CreateUser"))]
    async fn create_user(
        &self,
        request: Request<CreateUserRequest>,
    ) -> Result<Response<CreateUserResponse>, Status> {
        let req = request.into_inner();
        require("username", &req.username)?;
        require("email", &req.email)?;
        require("password", &req.password)?;

        let hash = password::hash_password(&req.password)
            .map_err(|e| Status::internal(format!("Password hashing failed: {e}")))?;

        let user_id = uuid::Uuid::new_v4().to_string();
        self.db
            .create_user(&user_id, &req.username, &req.email, &hash)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => Status::already_exists("Email already registered"),
                other => db_status(other),
            })?;

        info!(user_id = %user_id, username = %req.username, "User created");

        Ok(Response::new(CreateUserResponse { user_id }))
    }

    #[instrument(skip(self, request), fields(rpc = "AuthUser"))]
    async fn auth_user(
        &self,
        request: Request<AuthUserRequest>,
    ) -> Result<Response<AuthUserResponse>, Status> {
        let req = request.into_inner();
        require("email", &req.email)?;
        require("password", &req.password)?;

        let user = match self.db.get_user_by_email(&req.email).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => {
                return Err(Status::unauthenticated("Invalid credentials"));
            }
            Err(e) => return Err(db_status(e)),
        };

        let valid = password::verify_password(&req.password, &user.password_hash)
            .map_err(|_| Status::internal("Password verification failed"))?;
        if !valid {
            warn!(user_id = %user.id, "Failed sign-in attempt");
            return Err(Status::unauthenticated("Invalid credentials"));
        }

        let (token, _ttl) = self
            .jwt
            .issue(&user.id, &user.username, &user.email)
            .map_err(|e| Status::internal(format!("Token creation failed: {e}")))?;

        info!(user_id = %user.id, "User authenticated");

        Ok(Response::new(AuthUserResponse { token }))
    }

    #[instrument(skip(self, request), fields(rpc = "GetUser"))]
    async fn get_user(
        &self,
        request: Request<GetUserRequest>,
    ) -> Result<Response<GetUserResponse>, Status> {
        let req = request.into_inner();
        require("user_id", &req.user_id)?;

        let user = self.db.get_user(&req.user_id).await.map_err(db_status)?;

        Ok(Response::new(GetUserResponse {
            user_id: user.id,
            username: user.username,
            email: user.email,
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "DeleteUser"))]
    async fn delete_user(
        &self,
        request: Request<DeleteUserRequest>,
    ) -> Result<Response<DeleteUserResponse>, Status> {
        let req = request.into_inner();
        require("user_id", &req.user_id)?;

        let deleted = self.db.delete_user(&req.user_id).await.map_err(db_status)?;
        if !deleted {
            return Err(Status::not_found(format!("User {}", req.user_id)));
        }

        info!(user_id = %req.user_id, "User deleted");

        Ok(Response::new(DeleteUserResponse {
            success: true,
            message: "User deleted".to_string(),
        }))
    }
}

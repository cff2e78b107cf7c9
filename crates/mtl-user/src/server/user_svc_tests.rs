//! Tests for `UserService` gRPC implementation.

use std::sync::Arc;

use tonic::{Code, Request};

use mtl_core::auth::JwtManager;
use mtl_proto::v1::user_service_server::UserService;
use mtl_proto::v1::{AuthUserRequest, CreateUserRequest, DeleteUserRequest, GetUserRequest};

use super::user_svc::UserServiceImpl;
use crate::storage::UserDatabase;

async fn setup() -> (UserServiceImpl, Arc<JwtManager>) {
    let db = UserDatabase::open_in_memory().await.unwrap();
    let jwt = Arc::new(JwtManager::new(b"test-secret", 3600));
    (UserServiceImpl::new(db, Arc::clone(&jwt)), jwt)
}

fn alice() -> CreateUserRequest {
    CreateUserRequest {
        username: "alice".into(),
        email: "alice@example.com".into(),
        password: "password123".into(),
    }
}

async fn create_alice(svc: &UserServiceImpl) -> String {
    svc.create_user(Request::new(alice()))
        .await
        .unwrap()
        .into_inner()
        .user_id
}

#[tokio::test]
async fn create_auth_get_delete_round_trip() {
    let (svc, jwt) = setup().await;
    let user_id = create_alice(&svc).await;
    assert!(!user_id.is_empty());

    let token = svc
        .auth_user(Request::new(AuthUserRequest {
            email: "alice@example.com".into(),
            password: "password123".into(),
        }))
        .await
        .unwrap()
        .into_inner()
        .token;
    let claims = jwt.validate(&token).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.email, "alice@example.com");

    let user = svc
        .get_user(Request::new(GetUserRequest {
            user_id: user_id.clone(),
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");

    let deleted = svc
        .delete_user(Request::new(DeleteUserRequest {
            user_id: user_id.clone(),
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(deleted.success);

    let err = svc
        .get_user(Request::new(GetUserRequest { user_id }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn duplicate_email_is_already_exists() {
    let (svc, _) = setup().await;
    create_alice(&svc).await;

    let err = svc
        .create_user(Request::new(CreateUserRequest {
            username: "alice-again".into(),
            ..alice()
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::AlreadyExists);
}

#[tokio::test]
async fn empty_fields_are_invalid() {
    let (svc, _) = setup().await;
    let err = svc
        .create_user(Request::new(CreateUserRequest {
            password: String::new(),
            ..alice()
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    let err = svc
        .get_user(Request::new(GetUserRequest {
            user_id: "  ".into(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn wrong_password_is_unauthenticated() {
    let (svc, _) = setup().await;
    create_alice(&svc).await;

    let err = svc
        .auth_user(Request::new(AuthUserRequest {
            email: "alice@example.com".into(),
            password: "wrongpassword".into(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn unknown_email_is_unauthenticated() {
    let (svc, _) = setup().await;

    let err = svc
        .auth_user(Request::new(AuthUserRequest {
            email: "nobody@example.com".into(),
            password: "password123".into(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn delete_missing_user_is_not_found() {
    let (svc, _) = setup().await;

    let err = svc
        .delete_user(Request::new(DeleteUserRequest {
            user_id: "missing".into(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

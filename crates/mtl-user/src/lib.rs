//! MTL User Service Library
//!
//! - `SQLite` storage for user accounts
//! - argon2id password hashing
//! - `UserService` gRPC implementation issuing access tokens

pub mod password;
pub mod server;
pub mod storage;

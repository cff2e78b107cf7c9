//! `SQLite` storage for the user service.

mod db;
mod models;
mod queries;


pub use db::UserDatabase;
pub use models::User;
pub use mtl_core::db::DatabaseError;

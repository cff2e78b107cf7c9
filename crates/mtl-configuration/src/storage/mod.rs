//! `SQLite` storage for the configuration service.

mod db;
mod models;
mod queries;


pub use db::ConfigurationDatabase;
pub use models::{AgentSettings, Configuration};
pub use mtl_core::db::DatabaseError;

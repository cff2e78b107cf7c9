//! MTL Gateway Library
//!
//! - REST routes fanning out to the user and configuration services
//! - JWT authentication middleware
//! - Duplex relay between a client websocket and the agent gRPC stream

pub mod clients;
pub mod http;
pub mod relay;

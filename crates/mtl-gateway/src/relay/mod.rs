//! Duplex relay between one client connection and one agent stream.
//!
//! A session runs two pumps (backend to client and client to backend) that
//! share a single-fire [`Termination`] signal. Whichever side stops first
//! fires it, the other pump observes it and exits, and teardown happens once
//! both have joined.

pub mod error;
pub mod grpc;
pub mod kind;
pub mod message;
pub mod session;
pub mod termination;
pub mod transport;
pub mod websocket;


pub use error::RelayError;
pub use grpc::GrpcAgentConnector;
pub use message::ClientMessage;
pub use session::RelaySession;
pub use termination::{Termination, TerminationReason};
pub use transport::{AgentConnector, AgentStream, ClientReceiver, ClientSender};

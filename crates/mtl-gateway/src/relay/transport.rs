//! Endpoints a relay session moves messages between.
//!
//! Production uses a split axum websocket on the client side and a tonic
//! bidirectional stream on the backend side; tests substitute in-memory
//! channels.

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tonic::Status;

use mtl_proto::v1::AgentMessage;

use super::error::RelayError;
use super::message::ClientMessage;

/// Receive half of the client connection.
#[async_trait]
pub trait ClientReceiver: Send + 'static {
    /// Next client message.
    ///
    /// `None` means the client went away (close frame or end of stream).
    /// `Some(Err(ProtocolViolation))` is a single bad frame; other errors
    /// are transport failures.
    async fn recv(&mut self) -> Option<Result<ClientMessage, RelayError>>;
}

/// Send half of the client connection.
#[async_trait]
pub trait ClientSender: Send + 'static {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), RelayError>;

    async fn close(&mut self) -> Result<(), RelayError>;
}

/// An open agent stream. Dropping `sender` ends the request side.
pub struct AgentStream {
    pub sender: mpsc::Sender<AgentMessage>,
    pub events: BoxStream<'static, Result<AgentMessage, Status>>,
}

/// Opens agent streams.
#[async_trait]
pub trait AgentConnector: Send + Sync {
    /// Open a stream whose first request message is `initialize`.
    ///
    /// The message is queued before the call is issued, so backends that
    /// wait for it before sending response headers still answer.
    async fn open_stream(&self, initialize: AgentMessage) -> Result<AgentStream, RelayError>;
}

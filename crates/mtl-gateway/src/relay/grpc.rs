//! Backend transport over the `AgentService` bidirectional stream.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tracing::debug;

use mtl_proto::v1::AgentMessage;
use mtl_proto::v1::agent_service_client::AgentServiceClient;

use super::error::{RelayError, status_text};
use super::transport::{AgentConnector, AgentStream};

#[derive(Clone)]
pub struct GrpcAgentConnector {
    client: AgentServiceClient<Channel>,
    buffer: usize,
}

impl GrpcAgentConnector {
    /// `buffer` bounds how many client messages may queue ahead of the
    /// backend before the outbound pump waits.
    pub fn new(client: AgentServiceClient<Channel>, buffer: usize) -> Self {
        Self {
            client,
            buffer: buffer.max(1),
        }
    }
}

#[async_trait]
impl AgentConnector for GrpcAgentConnector {
    async fn open_stream(&self, initialize: AgentMessage) -> Result<AgentStream, RelayError> {
        let (tx, rx) = mpsc::channel(self.buffer);
        tx.send(initialize)
            .await
            .map_err(|_| RelayError::StreamOpen("request channel closed".into()))?;

        let mut client = self.client.clone();
        let response = client
            .agent_websocket_stream(ReceiverStream::new(rx))
            .await
            .map_err(|status| {
                debug!(code = ?status.code(), "AgentWebsocketStream rejected");
                RelayError::StreamOpen(status_text(&status))
            })?;

        Ok(AgentStream {
            sender: tx,
            events: response.into_inner().boxed(),
        })
    }
}

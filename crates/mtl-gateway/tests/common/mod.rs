//! Shared fixtures for gateway integration tests: in-process backend
//! services and in-memory client transports.
#![allow(dead_code, clippy::unwrap_used)]

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::transport::Server;
use tonic::transport::server::Router;
use tonic::{Request, Response, Status, Streaming};

use mtl_configuration::cipher::FieldCipher;
use mtl_configuration::server::ConfigurationServiceImpl;
use mtl_configuration::storage::ConfigurationDatabase;
use mtl_core::auth::JwtManager;
use mtl_core::config::ServiceEndpoints;
use mtl_gateway::clients::BackendClients;
use mtl_gateway::http::{AppState, build_router};
use mtl_gateway::relay::{ClientMessage, ClientReceiver, ClientSender, GrpcAgentConnector, RelayError};
use mtl_proto::v1::agent_service_server::{AgentService, AgentServiceServer};
use mtl_proto::v1::configuration_service_server::ConfigurationServiceServer;
use mtl_proto::v1::user_service_server::UserServiceServer;
use mtl_proto::v1::{AgentMessage, MessageType, SendAgentMessageRequest, SendAgentMessageResponse};
use mtl_user::server::UserServiceImpl;
use mtl_user::storage::UserDatabase;

pub const JWT_SECRET: &[u8] = b"gateway-test-secret";

/// Serve a tonic router on an ephemeral port and return its URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        router
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });
    format!("http://{addr}")
}

/// Start user, configuration and echo-agent services.
pub async fn spawn_backends() -> ServiceEndpoints {
    spawn_backends_with_agent(EchoAgent::default()).await
}

/// Start user and configuration services next to the given agent.
pub async fn spawn_backends_with_agent(agent: EchoAgent) -> ServiceEndpoints {
    let jwt = Arc::new(JwtManager::new(JWT_SECRET, 3600));
    let users = UserServiceImpl::new(UserDatabase::open_in_memory().await.unwrap(), jwt);
    let cipher = Arc::new(FieldCipher::from_key(&[9u8; 32]).unwrap());
    let configurations = ConfigurationServiceImpl::new(
        ConfigurationDatabase::open_in_memory().await.unwrap(),
        cipher,
    );

    ServiceEndpoints {
        user: serve(Server::builder().add_service(UserServiceServer::new(users))).await,
        configuration: serve(
            Server::builder().add_service(ConfigurationServiceServer::new(configurations)),
        )
        .await,
        agent: serve(Server::builder().add_service(AgentServiceServer::new(agent))).await,
    }
}

/// Serve only an agent service and return its URL.
pub async fn serve_agent(agent: EchoAgent) -> String {
    serve(Server::builder().add_service(AgentServiceServer::new(agent))).await
}

/// Gateway router wired to the given backends.
pub fn gateway(endpoints: &ServiceEndpoints) -> axum::Router {
    let clients = BackendClients::connect_lazy(endpoints, Duration::from_secs(5)).unwrap();
    let connector = GrpcAgentConnector::new(clients.agents.clone(), 16);
    build_router(AppState {
        jwt: Arc::new(JwtManager::new(JWT_SECRET, 3600)),
        clients,
        connector: Arc::new(connector),
        session_timeout: Duration::from_secs(60),
        teardown_grace: Duration::from_secs(2),
    })
}

/// Agent that refuses to answer until it has seen INITIALIZE, then echoes.
/// A recording agent also reports every request message it reads.
#[derive(Clone, Default)]
pub struct EchoAgent {
    seen: Option<mpsc::UnboundedSender<AgentMessage>>,
}

impl EchoAgent {
    pub fn recording() -> (Self, mpsc::UnboundedReceiver<AgentMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { seen: Some(tx) }, rx)
    }

    fn record(&self, message: &AgentMessage) {
        if let Some(seen) = &self.seen {
            let _ = seen.send(message.clone());
        }
    }
}

type AgentEvents = Pin<Box<dyn Stream<Item = Result<AgentMessage, Status>> + Send>>;

fn reply(message_type: MessageType, user_id: &str, content: String) -> AgentMessage {
    AgentMessage {
        message_type: message_type.into(),
        user_id: user_id.to_string(),
        content,
        metadata: std::collections::HashMap::new(),
    }
}

#[tonic::async_trait]
impl AgentService for EchoAgent {
    type AgentWebsocketStreamStream = AgentEvents;

    async fn agent_websocket_stream(
        &self,
        request: Request<Streaming<AgentMessage>>,
    ) -> Result<Response<Self::AgentWebsocketStreamStream>, Status> {
        let mut inbound = request.into_inner();
        let init = inbound
            .message()
            .await?
            .ok_or_else(|| Status::invalid_argument("missing INITIALIZE"))?;
        self.record(&init);
        if init.message_type() != MessageType::Initialize {
            return Err(Status::invalid_argument("first message must be INITIALIZE"));
        }
        let user_id = init.user_id.clone();
        let config_id = init.metadata.get("config_id").cloned().unwrap_or_default();

        let (tx, rx) = mpsc::channel(16);
        let agent = self.clone();
        tokio::spawn(async move {
            let _ = tx
                .send(Ok(reply(
                    MessageType::AgentResponse,
                    &user_id,
                    format!("ready {config_id}"),
                )))
                .await;
            while let Ok(Some(msg)) = inbound.message().await {
                agent.record(&msg);
                match msg.message_type() {
                    MessageType::UserMessage => {
                        let mut echo =
                            reply(MessageType::AgentResponse, &msg.user_id, format!("echo {}", msg.content));
                        echo.metadata = msg.metadata;
                        if tx.send(Ok(echo)).await.is_err() {
                            break;
                        }
                    }
                    MessageType::Close => {
                        let _ = tx
                            .send(Ok(reply(MessageType::Close, &msg.user_id, "bye".into())))
                            .await;
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn send_agent_message(
        &self,
        request: Request<SendAgentMessageRequest>,
    ) -> Result<Response<SendAgentMessageResponse>, Status> {
        let req = request.into_inner();
        Ok(Response::new(SendAgentMessageResponse {
            message: format!("{} said {}", req.user_id, req.message),
        }))
    }
}

// --- in-memory client transport --------------------------------------------

pub struct ChannelReceiver(pub mpsc::UnboundedReceiver<Result<ClientMessage, RelayError>>);

#[async_trait]
impl ClientReceiver for ChannelReceiver {
    async fn recv(&mut self) -> Option<Result<ClientMessage, RelayError>> {
        self.0.recv().await
    }
}

pub struct ChannelSender(pub mpsc::UnboundedSender<Option<ClientMessage>>);

#[async_trait]
impl ClientSender for ChannelSender {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), RelayError> {
        self.0
            .send(Some(message.clone()))
            .map_err(|e| RelayError::Transport(e.to_string()))
    }

    /// Signals close as `None`.
    async fn close(&mut self) -> Result<(), RelayError> {
        let _ = self.0.send(None);
        Ok(())
    }
}

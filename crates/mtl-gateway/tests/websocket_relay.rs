#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! The agent stream route end to end: a websocket client through the axum
//! server and the relay to a gRPC agent.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use mtl_core::auth::JwtManager;
use mtl_gateway::relay::ClientMessage;
use mtl_proto::v1::{AgentMessage, MessageType};

use common::{EchoAgent, JWT_SECRET};

const WAIT: Duration = Duration::from_secs(5);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_gateway(agent: EchoAgent) -> SocketAddr {
    let endpoints = common::spawn_backends_with_agent(agent).await;
    let app = common::gateway(&endpoints);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

fn token(user_id: &str) -> String {
    JwtManager::new(JWT_SECRET, 3600)
        .issue(user_id, "wsuser", "ws@example.com")
        .unwrap()
        .0
}

fn stream_url(addr: SocketAddr, config_id: &str, user_id: &str) -> String {
    format!(
        "ws://{addr}/api/v1/agents/stream?config_id={config_id}&token={}",
        token(user_id)
    )
}

async fn connect(addr: SocketAddr) -> Socket {
    let (socket, _) = tokio_tungstenite::connect_async(stream_url(addr, "cfg-ws", "user-ws"))
        .await
        .unwrap();
    socket
}

/// Next relay message, skipping control frames.
async fn recv(socket: &mut Socket) -> ClientMessage {
    loop {
        let frame = timeout(WAIT, socket.next()).await.unwrap().unwrap().unwrap();
        match frame {
            Message::Text(text) => return ClientMessage::from_json(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => {}
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn send_text(socket: &mut Socket, json: &str) {
    socket.send(Message::text(json.to_owned())).await.unwrap();
}

async fn seen(rx: &mut mpsc::UnboundedReceiver<AgentMessage>) -> AgentMessage {
    timeout(WAIT, rx.recv()).await.unwrap().unwrap()
}

#[tokio::test]
async fn relays_user_message_and_agent_reply() {
    let (agent, mut seen_rx) = EchoAgent::recording();
    let addr = spawn_gateway(agent).await;
    let mut socket = connect(addr).await;

    let init = seen(&mut seen_rx).await;
    assert_eq!(init.message_type(), MessageType::Initialize);
    assert_eq!(init.user_id, "user-ws");
    assert_eq!(init.metadata.get("config_id").map(String::as_str), Some("cfg-ws"));
    assert_eq!(recv(&mut socket).await, ClientMessage::new("AGENT_RESPONSE", "ready cfg-ws"));

    send_text(
        &mut socket,
        r#"{"type":"USER_MESSAGE","content":"hi","metadata":{"trace":"t-1"}}"#,
    )
    .await;
    let forwarded = seen(&mut seen_rx).await;
    assert_eq!(forwarded.message_type(), MessageType::UserMessage);
    assert_eq!(forwarded.user_id, "user-ws");
    assert_eq!(forwarded.content, "hi");

    let reply = recv(&mut socket).await;
    assert_eq!(reply.kind, "AGENT_RESPONSE");
    assert_eq!(reply.content, "echo hi");
    assert_eq!(reply.metadata.get("trace").map(String::as_str), Some("t-1"));
}

#[tokio::test]
async fn binary_ping_and_bad_frames() {
    let (agent, mut seen_rx) = EchoAgent::recording();
    let addr = spawn_gateway(agent).await;
    let mut socket = connect(addr).await;
    seen(&mut seen_rx).await;
    recv(&mut socket).await;

    // UTF-8 binary frames carry JSON like text frames.
    socket
        .send(Message::binary(
            br#"{"type":"USER_MESSAGE","content":"bin"}"#.to_vec(),
        ))
        .await
        .unwrap();
    assert_eq!(recv(&mut socket).await.content, "echo bin");

    socket.send(Message::Ping(vec![1, 2, 3].into())).await.unwrap();
    socket.send(Message::binary(vec![0xff, 0xfe, 0xfd])).await.unwrap();
    send_text(&mut socket, "{not json").await;
    send_text(&mut socket, r#"{"type":"DANCE","content":"x"}"#).await;
    send_text(&mut socket, r#"{"type":"USER_MESSAGE","content":"after"}"#).await;
    assert_eq!(recv(&mut socket).await.content, "echo after");

    // Only the two well-formed messages reached the agent.
    assert_eq!(seen(&mut seen_rx).await.content, "bin");
    assert_eq!(seen(&mut seen_rx).await.content, "after");
}

#[tokio::test]
async fn close_frame_reaches_agent_as_close() {
    let (agent, mut seen_rx) = EchoAgent::recording();
    let addr = spawn_gateway(agent).await;
    let mut socket = connect(addr).await;
    seen(&mut seen_rx).await;
    recv(&mut socket).await;

    socket.send(Message::Close(None)).await.unwrap();

    let close = seen(&mut seen_rx).await;
    assert_eq!(close.message_type(), MessageType::Close);
    assert_eq!(close.user_id, "user-ws");

    // The gateway finishes the close handshake.
    let ended = timeout(WAIT, async {
        while let Some(Ok(frame)) = socket.next().await {
            if frame.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(ended.is_ok());
}

#[tokio::test]
async fn upgrade_without_token_is_rejected() {
    let addr = spawn_gateway(EchoAgent::default()).await;
    let url = format!("ws://{addr}/api/v1/agents/stream?config_id=cfg-ws");

    let err = tokio_tungstenite::connect_async(url).await.unwrap_err();
    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), 401);
        }
        other => panic!("expected HTTP rejection, got {other:?}"),
    }
}

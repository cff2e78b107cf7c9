//! Client transport over an axum websocket.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};

use super::error::RelayError;
use super::message::ClientMessage;
use super::transport::{ClientReceiver, ClientSender};

/// Split a websocket into relay transport halves.
pub fn split(socket: WebSocket) -> (WsSender, WsReceiver) {
    let (sink, stream) = socket.split();
    (WsSender { sink }, WsReceiver { stream })
}

pub struct WsReceiver {
    stream: SplitStream<WebSocket>,
}

#[async_trait]
impl ClientReceiver for WsReceiver {
    async fn recv(&mut self) -> Option<Result<ClientMessage, RelayError>> {
        loop {
            let frame = match self.stream.next().await? {
                Ok(frame) => frame,
                Err(e) => return Some(Err(RelayError::Transport(e.to_string()))),
            };
            return match frame {
                Message::Text(text) => Some(ClientMessage::from_json(text.as_str())),
                Message::Binary(bytes) => Some(
                    std::str::from_utf8(&bytes)
                        .map_err(|e| RelayError::ProtocolViolation(e.to_string()))
                        .and_then(ClientMessage::from_json),
                ),
                // axum answers pings itself.
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => None,
            };
        }
    }
}

pub struct WsSender {
    sink: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl ClientSender for WsSender {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), RelayError> {
        let json = message.to_json()?;
        self.sink
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), RelayError> {
        self.sink
            .close()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))
    }
}

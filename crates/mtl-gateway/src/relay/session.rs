//! One relay session: authorize, open the agent stream, pump both
//! directions until the termination signal fires, then tear down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::{Mutex, mpsc};
use tonic::Status;
use tracing::{Instrument, debug, error, info, info_span, warn};

use mtl_core::auth::Claims;
use mtl_proto::v1::{AgentMessage, MessageType};

use super::error::{RelayError, status_text};
use super::kind;
use super::message::ClientMessage;
use super::termination::{Termination, TerminationReason};
use super::transport::{AgentConnector, AgentStream, ClientReceiver, ClientSender};

/// Default bound on teardown work: best-effort client sends and flushing
/// the agent stream.
pub const DEFAULT_TEARDOWN_GRACE: Duration = Duration::from_secs(2);

type AgentEvents = BoxStream<'static, Result<AgentMessage, Status>>;

/// Client send half shared by both pumps. The mutex serializes writes.
struct SharedClient<S> {
    inner: Arc<Mutex<S>>,
    grace: Duration,
}

impl<S> Clone for SharedClient<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            grace: self.grace,
        }
    }
}

impl<S: ClientSender> SharedClient<S> {
    fn new(sender: S, grace: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sender)),
            grace,
        }
    }

    async fn send(&self, message: &ClientMessage) -> Result<(), RelayError> {
        self.inner.lock().await.send(message).await
    }

    /// Best-effort send, bounded by the teardown grace so a stalled client
    /// cannot hold the session open.
    async fn deliver(&self, message: &ClientMessage) {
        match tokio::time::timeout(self.grace, self.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, kind = %message.kind, "Best-effort client send failed"),
            Err(_) => debug!(kind = %message.kind, "Best-effort client send timed out"),
        }
    }

    async fn close(&self) {
        let closed = tokio::time::timeout(self.grace, async {
            self.inner.lock().await.close().await
        })
        .await;
        match closed {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Closing client connection failed"),
            Err(_) => debug!("Closing client connection timed out"),
        }
    }
}

/// An authorized relay session that has not started yet.
#[derive(Debug, Clone)]
pub struct RelaySession {
    user_id: String,
    config_id: String,
    timeout: Duration,
    grace: Duration,
}

impl RelaySession {
    /// Bind a session to the caller identity carried by `claims`.
    pub fn authorize(
        claims: Option<&Claims>,
        config_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RelayError> {
        let user_id = claims
            .map(|c| c.sub.trim())
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| RelayError::Unauthorized("no caller identity".into()))?;
        Ok(Self {
            user_id: user_id.to_string(),
            config_id: config_id.into(),
            timeout,
            grace: DEFAULT_TEARDOWN_GRACE,
        })
    }

    /// Override how long teardown may spend on best-effort client sends
    /// and on flushing the agent stream.
    #[must_use]
    pub const fn with_teardown_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Run the session to completion.
    ///
    /// Returns why the session ended, or `StreamOpen` if the agent stream
    /// could not be opened (the client has then already been sent ERROR).
    pub async fn run<R, S>(
        self,
        connector: &dyn AgentConnector,
        receiver: R,
        sender: S,
    ) -> Result<TerminationReason, RelayError>
    where
        R: ClientReceiver,
        S: ClientSender,
    {
        let span = info_span!(
            "relay_session",
            user_id = %self.user_id,
            config_id = %self.config_id
        );
        self.run_inner(connector, receiver, sender)
            .instrument(span)
            .await
    }

    async fn run_inner<R, S>(
        self,
        connector: &dyn AgentConnector,
        receiver: R,
        sender: S,
    ) -> Result<TerminationReason, RelayError>
    where
        R: ClientReceiver,
        S: ClientSender,
    {
        let client = SharedClient::new(sender, self.grace);

        let AgentStream {
            sender: backend,
            events,
        } = match connector.open_stream(self.initialize_message()).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Agent stream unavailable");
                client.deliver(&ClientMessage::error(e.to_string())).await;
                client.close().await;
                return Err(e);
            }
        };
        info!("Relay session started");

        let termination = Termination::new();
        let inbound = tokio::spawn(
            inbound_pump(events, client.clone(), termination.clone()).in_current_span(),
        );
        let outbound = tokio::spawn(
            outbound_pump(
                receiver,
                backend,
                client.clone(),
                termination.clone(),
                self.user_id.clone(),
            )
            .in_current_span(),
        );

        tokio::select! {
            () = tokio::time::sleep(self.timeout) => {
                if termination.fire(TerminationReason::Timeout) {
                    warn!(timeout_secs = self.timeout.as_secs(), "Relay session timed out");
                    let err = RelayError::Timeout(self.timeout);
                    client.deliver(&ClientMessage::error(err.to_string())).await;
                }
            }
            _ = termination.fired() => {}
        }

        // The outbound pump owns the request sender; joining it ends the
        // request side.
        let live_events = inbound.await.unwrap_or_else(|e| {
            error!(error = %e, "Inbound pump panicked");
            None
        });
        if let Err(e) = outbound.await {
            error!(error = %e, "Outbound pump panicked");
        }

        let reason = termination
            .reason()
            .unwrap_or(TerminationReason::BackendEnded);
        if reason == TerminationReason::BackendEnded {
            client.deliver(&ClientMessage::close()).await;
        }
        client.close().await;

        if let Some(events) = live_events {
            drain_agent_stream(events, self.grace).await;
        }

        info!(reason = %reason, "Relay session ended");
        Ok(reason)
    }

    fn initialize_message(&self) -> AgentMessage {
        AgentMessage {
            message_type: MessageType::Initialize.into(),
            user_id: self.user_id.clone(),
            content: String::new(),
            metadata: HashMap::from([("config_id".to_string(), self.config_id.clone())]),
        }
    }
}

/// Backend to client. Hands the agent stream back if it is still open.
async fn inbound_pump<S: ClientSender>(
    mut events: AgentEvents,
    client: SharedClient<S>,
    termination: Termination,
) -> Option<AgentEvents> {
    let still_open = loop {
        let next = tokio::select! {
            biased;
            _ = termination.fired() => break true,
            next = events.next() => next,
        };
        if termination.is_fired() {
            break true;
        }

        match next {
            None => {
                debug!("Agent stream ended");
                termination.fire(TerminationReason::BackendEnded);
                break false;
            }
            Some(Err(status)) => {
                warn!(code = ?status.code(), message = %status.message(), "Agent stream failed");
                client.deliver(&ClientMessage::error(status_text(&status))).await;
                termination.fire(TerminationReason::BackendError);
                break false;
            }
            Some(Ok(message)) => {
                let message_type = message.message_type();
                let out = ClientMessage {
                    kind: kind::backend_to_client(message_type).to_string(),
                    content: message.content,
                    metadata: message.metadata,
                };
                let sent = tokio::select! {
                    biased;
                    _ = termination.fired() => break true,
                    sent = client.send(&out) => sent,
                };
                if let Err(e) = sent {
                    warn!(error = %e, "Failed to deliver agent message to client");
                    termination.fire(TerminationReason::ClientSendFailed);
                    break true;
                }
                if message_type == MessageType::Close {
                    termination.fire(TerminationReason::BackendClosed);
                    break true;
                }
            }
        }
    };
    still_open.then_some(events)
}

/// Client to backend.
async fn outbound_pump<R: ClientReceiver, S: ClientSender>(
    mut receiver: R,
    backend: mpsc::Sender<AgentMessage>,
    client: SharedClient<S>,
    termination: Termination,
    user_id: String,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = termination.fired() => break,
            next = receiver.recv() => next,
        };
        if termination.is_fired() {
            break;
        }

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(RelayError::ProtocolViolation(reason))) => {
                warn!(reason = %reason, "Dropping malformed client frame");
                continue;
            }
            Some(Err(e)) => {
                debug!(error = %e, "Client read failed");
                client_gone(&backend, &user_id, &termination);
                break;
            }
            None => {
                debug!("Client disconnected");
                client_gone(&backend, &user_id, &termination);
                break;
            }
        };

        let Some(message_type) = kind::client_to_backend(&message.kind) else {
            debug!(kind = %message.kind, "Dropping client message of unrecognized type");
            continue;
        };

        let forward = AgentMessage {
            message_type: message_type.into(),
            user_id: user_id.clone(),
            content: message.content,
            metadata: message.metadata,
        };
        let sent = tokio::select! {
            biased;
            _ = termination.fired() => break,
            sent = backend.send(forward) => sent,
        };
        if sent.is_err() {
            warn!("Agent stream no longer accepts messages");
            client.deliver(&ClientMessage::error("Agent stream closed")).await;
            termination.fire(TerminationReason::BackendSendFailed);
            break;
        }

        if message_type == MessageType::Close {
            termination.fire(TerminationReason::ClientClosed);
            break;
        }
    }
}

/// Tell the backend the caller left, then stop the session.
fn client_gone(backend: &mpsc::Sender<AgentMessage>, user_id: &str, termination: &Termination) {
    let close = AgentMessage {
        message_type: MessageType::Close.into(),
        user_id: user_id.to_string(),
        content: String::new(),
        metadata: HashMap::new(),
    };
    if let Err(e) = backend.try_send(close) {
        debug!(error = %e, "Could not forward CLOSE to agent stream");
    }
    termination.fire(TerminationReason::ClientDisconnected);
}

/// Hold the response side open until the backend has read the rest of the
/// request stream. Dropping it earlier cancels the call and loses a queued
/// CLOSE. Anything the backend still sends is discarded.
async fn drain_agent_stream(mut events: AgentEvents, grace: Duration) {
    let drained = tokio::time::timeout(grace, async {
        let mut discarded = 0usize;
        while let Some(Ok(_)) = events.next().await {
            discarded += 1;
        }
        discarded
    })
    .await;
    match drained {
        Ok(discarded) => debug!(discarded, "Agent stream finished"),
        Err(_) => debug!(grace_ms = grace.as_millis(), "Agent stream did not finish in time"),
    }
}

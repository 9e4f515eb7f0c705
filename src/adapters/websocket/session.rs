//! Per-connection task pair.
//!
//! After the upgrade the socket is split:
//!
//! - the **writer** task owns the sink and drains the outbound queue
//! - the **reader** loop (this task) handles client frames
//!
//! The session ends on the first of: client close, transport error, or the
//! handshake token's expiry. Cleanup always runs through
//! [`RealtimeHub::terminate`].

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::task::JoinHandle;

use crate::domain::foundation::{ConnectionId, StateMachine, Timestamp};
use crate::domain::realtime::{ConnectionState, TerminationCause};

use super::hub::RealtimeHub;
use super::messages::CloseCode;
use super::registry::OutboundReceiver;

/// How long the writer gets to flush before an expiry close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

type WsSink = SplitSink<WebSocket, Message>;

/// Tracks the connection state machine for logging.
struct Lifecycle {
    state: ConnectionState,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: ConnectionState::default(),
        }
    }

    fn advance(&mut self, next: ConnectionState) {
        match self.state.transition_to(next) {
            Ok(state) => self.state = state,
            Err(e) => tracing::warn!(from = %self.state, to = %next, error = %e, "Unexpected connection transition"),
        }
    }
}

/// Runs one connection from handshake to cleanup.
pub async fn run_connection(mut socket: WebSocket, hub: Arc<RealtimeHub>, token: Option<String>) {
    let mut lifecycle = Lifecycle::new();

    let user = match hub.gate().authenticate(token.as_deref()).await {
        Ok(user) => user,
        Err(e) => {
            lifecycle.advance(ConnectionState::Rejected);
            let code = CloseCode::from(&e);
            tracing::info!(close_code = code.code(), reason = code.reason(), "Handshake rejected: {}", e);
            let _ = socket.send(close_message(code)).await;
            return;
        }
    };

    let admitted = hub.admit(&user).await;
    lifecycle.advance(ConnectionState::Registered);
    let id = admitted.info.id;

    let (sink, mut stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(sink, admitted.outbound, id));

    let expiry = wait_for_expiry(admitted.info.token_expires_at);
    tokio::pin!(expiry);

    let (cause, writer_finished) = tokio::select! {
        cause = read_loop(&mut stream, &hub, id) => (cause, false),
        _ = &mut expiry => (TerminationCause::AuthExpired, false),
        _ = &mut writer => (TerminationCause::TransportError, true),
    };

    hub.terminate(&id, cause).await;
    lifecycle.advance(ConnectionState::Terminated);

    if writer_finished {
        return;
    }
    if cause == TerminationCause::AuthExpired {
        close_after_flush(writer, stream, id).await;
    } else {
        writer.abort();
    }
}

/// Reads client frames until the client leaves or the transport fails.
async fn read_loop(
    stream: &mut SplitStream<WebSocket>,
    hub: &RealtimeHub,
    id: ConnectionId,
) -> TerminationCause {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => hub.handle_text(&id, &text).await,
            Ok(Message::Binary(_)) => {
                tracing::warn!(connection_id = %id, "Received unsupported binary message");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Protocol-level keepalive, answered by axum
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %id, "Client sent close frame");
                return TerminationCause::ClientDisconnect;
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, "Receive error: {}", e);
                return TerminationCause::TransportError;
            }
        }
    }
    TerminationCause::ClientDisconnect
}

/// Drains the outbound queue into the socket. Returns the sink once the
/// queue closes (connection unregistered) or a write fails.
async fn write_loop(mut sink: WsSink, mut outbound: OutboundReceiver, id: ConnectionId) -> WsSink {
    while let Some(envelope) = outbound.recv().await {
        let text = match serde_json::to_string(envelope.as_ref()) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(connection_id = %id, error = %e, "Failed to serialize envelope");
                continue;
            }
        };
        if let Err(e) = sink.send(Message::Text(text)).await {
            tracing::debug!(connection_id = %id, "Send error, closing connection: {}", e);
            break;
        }
    }
    sink
}

/// Resolves when the token expires; never resolves without an expiry.
async fn wait_for_expiry(expires_at: Option<Timestamp>) {
    match expires_at {
        Some(expires_at) => tokio::time::sleep(expires_at.until()).await,
        None => std::future::pending::<()>().await,
    }
}

/// Lets the writer flush what was queued, then sends the expiry close frame.
async fn close_after_flush(
    mut writer: JoinHandle<WsSink>,
    stream: SplitStream<WebSocket>,
    id: ConnectionId,
) {
    let sink = match tokio::time::timeout(CLOSE_GRACE, &mut writer).await {
        Ok(Ok(sink)) => sink,
        Ok(Err(e)) => {
            tracing::debug!(connection_id = %id, "Writer task failed: {}", e);
            return;
        }
        Err(_) => {
            writer.abort();
            return;
        }
    };

    match sink.reunite(stream) {
        Ok(mut socket) => {
            tracing::info!(connection_id = %id, "Token expired; closing connection");
            let _ = socket.send(close_message(CloseCode::TokenExpired)).await;
        }
        Err(e) => tracing::debug!(connection_id = %id, "Could not reunite socket: {}", e),
    }
}

fn close_message(code: CloseCode) -> Message {
    Message::Close(Some(CloseFrame {
        code: code.code(),
        reason: Cow::Borrowed(code.reason()),
    }))
}

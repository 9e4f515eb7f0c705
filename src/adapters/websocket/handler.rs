//! WebSocket upgrade handler for realtime inventory connections.
//!
//! Handles the HTTP → WebSocket upgrade. Authentication happens after the
//! upgrade so a refused client receives a close frame with a code it can
//! act on, rather than an opaque HTTP error from the browser API.

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use super::gate::extract_token;
use super::hub::RealtimeHub;
use super::session::run_connection;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub hub: Arc<RealtimeHub>,
}

impl WebSocketState {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self { hub }
    }
}

/// Query string accepted on the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Fallback for clients that cannot set an `Authorization` header.
    pub token: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(params): Query<ConnectParams>,
    State(state): State<WebSocketState>,
) -> Response {
    let token = extract_token(&headers, params.token.as_deref());
    ws.on_upgrade(move |socket| run_connection(socket, state.hub, token))
}

/// Create axum router for the WebSocket endpoint.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .merge(websocket_router())
///     .with_state(WebSocketState::new(hub));
/// ```
pub fn websocket_router() -> Router<WebSocketState> {
    Router::new().route("/ws", get(ws_handler))
}

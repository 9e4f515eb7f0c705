//! HTTP handlers for realtime introspection.

use std::sync::Arc;

use axum::extract::{Json, State};

use crate::adapters::websocket::RealtimeHub;

use super::dto::{ConnectionView, ConnectionsResponse, HealthResponse};

/// Shared state for the introspection routes.
#[derive(Clone)]
pub struct RealtimeAppState {
    pub hub: Arc<RealtimeHub>,
}

impl RealtimeAppState {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self { hub }
    }
}

/// Liveness probe with the live connection count.
pub async fn health(State(state): State<RealtimeAppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.hub.registry().count().await,
    })
}

/// Lists live connections, oldest first, with delivery counters.
pub async fn list_connections(State(state): State<RealtimeAppState>) -> Json<ConnectionsResponse> {
    let infos = state.hub.registry().list().await;

    let mut connections = Vec::with_capacity(infos.len());
    for info in infos {
        let channels = state.hub.subscriptions().channels_of(&info.id).await;
        connections.push(ConnectionView { info, channels });
    }

    Json(ConnectionsResponse {
        count: connections.len(),
        connections,
        stats: state.hub.broadcaster().stats(),
    })
}

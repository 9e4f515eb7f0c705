//! HTTP DTOs for realtime introspection endpoints.

use serde::Serialize;

use crate::adapters::websocket::DeliveryStats;
use crate::domain::realtime::{Channel, ConnectionInfo};

/// `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
}

/// One live connection with its current channels.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionView {
    #[serde(flatten)]
    pub info: ConnectionInfo,
    pub channels: Vec<Channel>,
}

/// `GET /api/realtime/connections`
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionsResponse {
    pub count: usize,
    pub connections: Vec<ConnectionView>,
    pub stats: DeliveryStats,
}

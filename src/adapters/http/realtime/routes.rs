//! HTTP routes for realtime introspection.

use axum::routing::get;
use axum::Router;

use super::handlers::{health, list_connections, RealtimeAppState};

/// Creates the introspection router.
pub fn realtime_routes(state: RealtimeAppState) -> Router {
    Router::new()
        // GET /health
        .route("/health", get(health))
        // GET /api/realtime/connections
        .route("/api/realtime/connections", get(list_connections))
        .with_state(state)
}

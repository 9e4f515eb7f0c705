//! Realtime HTTP adapter module.
//!
//! Operational endpoints for the gateway: liveness and connection
//! introspection.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ConnectionView, ConnectionsResponse, HealthResponse};
pub use handlers::RealtimeAppState;
pub use routes::realtime_routes;

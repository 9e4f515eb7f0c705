//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Handshake token validation (HS256 JWT, mock)
//! - `snapshot` - Dashboard metrics and alert sources
//! - `websocket` - Connection registry, subscriptions, fan-out, sessions
//! - `http` - Health and connection introspection routes

pub mod auth;
pub mod http;
pub mod snapshot;
pub mod websocket;

//! HTTP adapters - operational endpoints.
//!
//! The gateway's only REST surface is introspection; everything else
//! travels over the WebSocket.

pub mod realtime;

pub use realtime::{realtime_routes, RealtimeAppState};

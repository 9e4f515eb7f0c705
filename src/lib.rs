//! OMNIX Realtime - authenticated WebSocket gateway for inventory events
//!
//! Dashboard clients connect once, subscribe to named channels, and receive
//! product, stock, alert, order, recommendation and metrics events as the
//! rest of the OMNIX platform publishes them.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;

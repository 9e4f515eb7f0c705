//! WebSocket adapters for realtime inventory updates.
//!
//! This module pushes domain events to connected dashboard clients over
//! authenticated WebSocket connections.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │              Domain services (products, alerts, orders)             │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ RealtimePublisher::emit_*
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        EventBroadcaster                             │
//! │   - Maps RealtimeEvent → channels + envelope                        │
//! │   - Raises the low-stock alert once per stock change                │
//! │   - Looks up subscribers, enqueues without blocking                 │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │        SubscriptionTable            ConnectionRegistry              │
//! │   products   → {a, b}               a → (user-1, queue)             │
//! │   product.p1 → {b}                  b → (user-2, queue)             │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     ▼ writer task per connection
//!                                  sockets
//! ```
//!
//! # Components
//!
//! - [`messages`] - Envelope, client messages and close codes
//! - [`registry`] - Live connections and their outbound queues
//! - [`subscriptions`] - Channel ↔ connection table
//! - [`broadcaster`] - Fan-out and the `RealtimePublisher` implementation
//! - [`snapshots`] - Targeted current-state replies
//! - [`gate`] - Handshake token extraction and verification
//! - [`hub`] - Owns the above; admission, dispatch and cleanup
//! - [`session`] - Per-connection reader/writer tasks
//! - [`handler`] - Axum upgrade handler

pub mod broadcaster;
pub mod gate;
pub mod handler;
pub mod hub;
pub mod messages;
pub mod registry;
pub mod session;
pub mod snapshots;
pub mod subscriptions;

pub use broadcaster::{DeliveryStats, EventBroadcaster};
pub use gate::{extract_token, HandshakeGate, TOKEN_QUERY_PARAM};
pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use hub::{AdmittedConnection, HubSettings, RealtimeHub};
pub use messages::{ClientMessage, CloseCode, Envelope};
pub use registry::{ConnectionHandle, ConnectionRegistry, DeliveryError};
pub use snapshots::SnapshotResponder;
pub use subscriptions::{SubscriptionError, SubscriptionTable};

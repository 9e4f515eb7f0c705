//! WebSocket message types for realtime inventory updates.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: one envelope shape for broadcasts, snapshots and replies
//! - Client → Server: subscribe/unsubscribe, snapshot requests, ping

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::foundation::{AuthError, ConnectionId, Timestamp, UserId};
use crate::domain::realtime::{Channel, RealtimeEvent};

// ============================================
// Server → Client Messages
// ============================================

/// Uniform outbound envelope.
///
/// ```json
/// { "channel": "products", "type": "product.updated", "payload": {...}, "timestamp": "..." }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub channel: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub payload: Value,
    pub timestamp: Timestamp,
}

/// Reply type tags that are not domain events.
pub mod reply_types {
    pub const CONNECTION_ESTABLISHED: &str = "connection.established";
    pub const SUBSCRIPTION_CONFIRMED: &str = "subscription.confirmed";
    pub const SUBSCRIPTION_REMOVED: &str = "subscription.removed";
    pub const PONG: &str = "pong";
    pub const ERROR: &str = "error";
}

/// Error codes carried in `error` envelopes.
pub mod error_codes {
    pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";
    pub const INVALID_CHANNEL: &str = "INVALID_CHANNEL";
    pub const SUBSCRIPTION_LIMIT: &str = "SUBSCRIPTION_LIMIT";
    pub const SNAPSHOT_FAILED: &str = "SNAPSHOT_FAILED";
}

impl Envelope {
    /// Builds an envelope stamped with the current server time.
    pub fn new(channel: impl Into<String>, message_type: impl Into<String>, payload: Value) -> Self {
        Self {
            channel: channel.into(),
            message_type: message_type.into(),
            payload,
            timestamp: Timestamp::now(),
        }
    }

    /// Envelope for a domain event on one of its channels.
    pub fn for_event(channel: &Channel, event: &RealtimeEvent) -> Self {
        Self::new(channel.to_string(), event.event_type(), event.payload())
    }

    /// Sent once after a successful handshake.
    pub fn connection_established(
        connection_id: ConnectionId,
        user_id: &UserId,
        channels: &[Channel],
    ) -> Self {
        Self::new(
            Channel::System.to_string(),
            reply_types::CONNECTION_ESTABLISHED,
            json!({
                "connectionId": connection_id,
                "userId": user_id,
                "channels": channels,
            }),
        )
    }

    pub fn subscription_confirmed(channel: &Channel) -> Self {
        Self::new(
            channel.to_string(),
            reply_types::SUBSCRIPTION_CONFIRMED,
            json!({ "channel": channel }),
        )
    }

    pub fn subscription_removed(channel: &Channel) -> Self {
        Self::new(
            channel.to_string(),
            reply_types::SUBSCRIPTION_REMOVED,
            json!({ "channel": channel }),
        )
    }

    pub fn pong() -> Self {
        Self::new(Channel::System.to_string(), reply_types::PONG, json!({}))
    }

    /// Targeted error reply.
    pub fn error(channel: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        Self::new(
            channel,
            reply_types::ERROR,
            json!({ "code": code, "message": message.into() }),
        )
    }

    /// Returns true for `error` replies.
    pub fn is_error(&self) -> bool {
        self.message_type == reply_types::ERROR
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from a client.
///
/// Channel names stay raw strings here so a bad name can be answered with a
/// targeted error instead of failing the whole frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe")]
    Subscribe { channel: String },

    #[serde(rename = "unsubscribe")]
    Unsubscribe { channel: String },

    #[serde(rename = "GET_DASHBOARD_METRICS")]
    GetDashboardMetrics,

    #[serde(rename = "GET_CURRENT_ALERTS")]
    GetCurrentAlerts,

    #[serde(rename = "ping")]
    Ping,
}

// ============================================
// Close codes
// ============================================

/// Application close codes sent when a connection is turned away or ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    MissingToken,
    InvalidToken,
    TokenExpired,
    HandshakeTimeout,
    AuthUnavailable,
}

impl CloseCode {
    pub fn code(self) -> u16 {
        match self {
            CloseCode::MissingToken => 4001,
            CloseCode::InvalidToken => 4002,
            CloseCode::TokenExpired => 4003,
            CloseCode::HandshakeTimeout => 4004,
            CloseCode::AuthUnavailable => 4005,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            CloseCode::MissingToken => "missing_token",
            CloseCode::InvalidToken => "invalid_token",
            CloseCode::TokenExpired => "token_expired",
            CloseCode::HandshakeTimeout => "handshake_timeout",
            CloseCode::AuthUnavailable => "auth_unavailable",
        }
    }
}

impl From<&AuthError> for CloseCode {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::MissingToken => CloseCode::MissingToken,
            AuthError::InvalidToken => CloseCode::InvalidToken,
            AuthError::TokenExpired => CloseCode::TokenExpired,
            AuthError::HandshakeTimeout => CloseCode::HandshakeTimeout,
            AuthError::ServiceUnavailable(_) => CloseCode::AuthUnavailable,
        }
    }
}

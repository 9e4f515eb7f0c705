//! Connection identity and lifecycle.
//!
//! ```text
//! Connecting ──auth ok──▶ Registered ──disconnect / expiry / error──▶ Terminated
//!     │
//!     └──────auth fail──▶ Rejected
//! ```

use std::fmt;

use serde::Serialize;

use crate::domain::foundation::{
    AuthenticatedUser, ConnectionId, StateMachine, Timestamp, UserId, UserRole,
};

/// Lifecycle state of a duplex connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Transport open, handshake token not yet verified.
    #[default]
    Connecting,
    /// Authenticated and present in the registry.
    Registered,
    /// Handshake failed; never registered.
    Rejected,
    /// Closed after registration; all subscriptions purged.
    Terminated,
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Connecting, Registered) | (Connecting, Rejected) | (Registered, Terminated)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Connecting => vec![Registered, Rejected],
            Registered => vec![Terminated],
            Rejected | Terminated => vec![],
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Registered => "registered",
            ConnectionState::Rejected => "rejected",
            ConnectionState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Why a registered connection reached `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    /// Client closed the socket or sent a close frame.
    ClientDisconnect,
    /// The token presented at handshake expired while connected.
    AuthExpired,
    /// Reading from or writing to the transport failed.
    TransportError,
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationCause::ClientDisconnect => "client_disconnect",
            TerminationCause::AuthExpired => "auth_expired",
            TerminationCause::TransportError => "transport_error",
        };
        f.write_str(s)
    }
}

/// Identity metadata for one live connection.
///
/// This is what `list()` exposes for operational introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
    pub connected_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<Timestamp>,
}

impl ConnectionInfo {
    /// Builds connection metadata for a freshly authenticated user.
    pub fn for_user(id: ConnectionId, user: &AuthenticatedUser) -> Self {
        Self {
            id,
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            connected_at: Timestamp::now(),
            token_expires_at: user.expires_at,
        }
    }
}

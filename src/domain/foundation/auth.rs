//! Authentication types for the domain layer.
//!
//! These types represent an authenticated user extracted from a bearer token
//! presented during the WebSocket handshake. Any token validator can populate
//! them via the `SessionValidator` port.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Timestamp, UserId};

/// Role claim carried by an OMNIX access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Staff,
    #[default]
    Viewer,
    /// Any role string the gateway does not know about, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

impl UserRole {
    /// Parses a role claim. Unknown values are preserved as `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "manager" => UserRole::Manager,
            "staff" => UserRole::Staff,
            "viewer" => UserRole::Viewer,
            _ => UserRole::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Staff => "staff",
            UserRole::Viewer => "viewer",
            UserRole::Other(raw) => raw,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated user extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The unique user identifier (`sub` claim).
    pub id: UserId,

    /// User's email address from the token claims.
    pub email: String,

    /// Role used by the frontend for feature gating.
    pub role: UserRole,

    /// When the presenting token stops being valid, if it carried an expiry.
    pub expires_at: Option<Timestamp>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user without a known expiry.
    pub fn new(id: UserId, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id,
            email: email.into(),
            role,
            expires_at: None,
        }
    }

    /// Attaches the token expiry.
    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Authentication errors that can occur during the handshake.
///
/// Each variant maps to a distinct WebSocket close code so clients can tell
/// why they were turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No bearer token in the header or query string.
    #[error("Authentication token missing")]
    MissingToken,

    /// The token is malformed, has an invalid signature, or wrong issuer/audience.
    #[error("Invalid token")]
    InvalidToken,

    /// The token signature is fine but it has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Verification did not finish within the handshake deadline.
    #[error("Token verification timed out")]
    HandshakeTimeout,

    /// The authentication backend is unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this error indicates the client should obtain a new token.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::TokenExpired
        )
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AuthError::ServiceUnavailable(_) | AuthError::HandshakeTimeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_id() -> UserId {
        UserId::new("user-123").unwrap()
    }

    #[test]
    fn authenticated_user_new_creates_user() {
        let user = AuthenticatedUser::new(test_user_id(), "test@example.com", UserRole::Manager);

        assert_eq!(user.id.as_str(), "user-123");
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.role, UserRole::Manager);
        assert!(user.expires_at.is_none());
    }

    #[test]
    fn with_expiry_sets_expiry() {
        let exp = Timestamp::from_unix_secs(2_000_000_000).unwrap();
        let user = AuthenticatedUser::new(test_user_id(), "a@b.c", UserRole::Staff).with_expiry(exp);
        assert_eq!(user.expires_at, Some(exp));
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(UserRole::parse("ADMIN"), UserRole::Admin);
        assert_eq!(UserRole::parse("Staff"), UserRole::Staff);
    }

    #[test]
    fn role_parse_keeps_unknown_values() {
        let role = UserRole::parse("auditor");
        assert_eq!(role, UserRole::Other("auditor".to_string()));
        assert_eq!(role.as_str(), "auditor");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&UserRole::Other("auditor".into())).unwrap(),
            "\"auditor\""
        );
    }

    #[test]
    fn auth_error_displays_correctly() {
        assert_eq!(format!("{}", AuthError::TokenExpired), "Token expired");
        assert_eq!(
            format!("{}", AuthError::service_unavailable("Connection refused")),
            "Auth service unavailable: Connection refused"
        );
    }

    #[test]
    fn auth_error_requires_reauthentication_for_token_errors() {
        assert!(AuthError::MissingToken.requires_reauthentication());
        assert!(AuthError::InvalidToken.requires_reauthentication());
        assert!(AuthError::TokenExpired.requires_reauthentication());
        assert!(!AuthError::HandshakeTimeout.requires_reauthentication());
        assert!(!AuthError::service_unavailable("").requires_reauthentication());
    }

    #[test]
    fn auth_error_is_transient_for_service_errors() {
        assert!(AuthError::service_unavailable("timeout").is_transient());
        assert!(AuthError::HandshakeTimeout.is_transient());
        assert!(!AuthError::InvalidToken.is_transient());
    }
}

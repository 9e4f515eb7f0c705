//! Handshake authentication.
//!
//! The bearer token comes from the `Authorization` header, falling back to
//! the `token` query parameter since browsers cannot set headers on a
//! WebSocket upgrade. Verification is bounded by the handshake timeout.

use std::sync::Arc;
use std::time::Duration;

use http::{header, HeaderMap};

use crate::domain::foundation::{AuthError, AuthenticatedUser, Timestamp};
use crate::ports::SessionValidator;

/// Query parameter carrying the token when no header is present.
pub const TOKEN_QUERY_PARAM: &str = "token";

const BEARER_PREFIX: &str = "Bearer ";

/// Picks the handshake token: the bearer header wins over the query string.
pub fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    from_header
        .or_else(|| query_token.map(str::trim).filter(|token| !token.is_empty()))
        .map(str::to_string)
}

/// Verifies handshake tokens.
pub struct HandshakeGate {
    validator: Arc<dyn SessionValidator>,
    timeout: Duration,
}

impl HandshakeGate {
    pub fn new(validator: Arc<dyn SessionValidator>, timeout: Duration) -> Self {
        Self { validator, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves a token to a user, or the reason the connection is refused.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;

        let user = match tokio::time::timeout(self.timeout, self.validator.validate(token)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Token verification timed out");
                return Err(AuthError::HandshakeTimeout);
            }
        };

        if user
            .expires_at
            .is_some_and(|expires_at| !expires_at.is_after(&Timestamp::now()))
        {
            return Err(AuthError::TokenExpired);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use http::HeaderValue;
    use chrono::Duration as ChronoDuration;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    fn gate(validator: MockSessionValidator) -> HandshakeGate {
        HandshakeGate::new(Arc::new(validator), Duration::from_millis(100))
    }

    #[test]
    fn header_token_wins_over_query() {
        let token = extract_token(&headers_with("Bearer from-header"), Some("from-query"));
        assert_eq!(token.as_deref(), Some("from-header"));
    }

    #[test]
    fn query_token_used_without_header() {
        let token = extract_token(&HeaderMap::new(), Some("from-query"));
        assert_eq!(token.as_deref(), Some("from-query"));
    }

    #[test]
    fn non_bearer_header_falls_back_to_query() {
        let token = extract_token(&headers_with("Basic abc"), Some("q"));
        assert_eq!(token.as_deref(), Some("q"));
    }

    #[test]
    fn blank_tokens_count_as_missing() {
        assert!(extract_token(&headers_with("Bearer   "), Some("")).is_none());
        assert!(extract_token(&HeaderMap::new(), None).is_none());
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let result = gate(MockSessionValidator::new()).authenticate(None).await;
        assert_eq!(result, Err(AuthError::MissingToken));
    }

    #[tokio::test]
    async fn valid_token_yields_user() {
        let validator = MockSessionValidator::new().with_test_user("good", "u-1");
        let user = gate(validator).authenticate(Some("good")).await.unwrap();
        assert_eq!(user.id.as_str(), "u-1");
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let result = gate(MockSessionValidator::new()).authenticate(Some("nope")).await;
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn slow_validator_times_out() {
        let validator = MockSessionValidator::new()
            .with_test_user("good", "u-1")
            .with_delay(Duration::from_millis(500));
        let result = gate(validator).authenticate(Some("good")).await;
        assert_eq!(result, Err(AuthError::HandshakeTimeout));
    }

    #[tokio::test]
    async fn already_expired_user_is_rejected() {
        let mut user = MockSessionValidator::test_user("u-1");
        user.expires_at = Some(Timestamp::from_datetime(
            chrono::Utc::now() - ChronoDuration::seconds(5),
        ));
        let validator = MockSessionValidator::new().with_user("stale", user);

        let result = gate(validator).authenticate(Some("stale")).await;
        assert_eq!(result, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn backend_outage_is_reported() {
        let validator = MockSessionValidator::new()
            .with_error(AuthError::service_unavailable("key store down"));
        let result = gate(validator).authenticate(Some("any")).await;
        assert!(matches!(result, Err(AuthError::ServiceUnavailable(_))));
    }
}

//! Mock session validator for testing.
//!
//! Lets tests run the handshake without minting real tokens.
//!
//! # Example
//!
//! ```ignore
//! use omnix_realtime::adapters::auth::MockSessionValidator;
//!
//! let validator = MockSessionValidator::new().with_test_user("valid-token", "user-123");
//!
//! let result = validator.validate("valid-token").await;
//! assert!(result.is_ok());
//! ```

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId, UserRole};
use crate::ports::SessionValidator;

/// Mock session validator for testing.
///
/// Stores a map of tokens to users. Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    /// Map of valid tokens to their associated users
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    /// Optional error to return for all validations (for error testing)
    force_error: RwLock<Option<AuthError>>,
    /// Artificial latency before answering (for timeout testing)
    delay: RwLock<Option<Duration>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockSessionValidator {
    /// Creates a new empty mock validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// A staff user with a derived email and no token expiry.
    ///
    /// Panics if `user_id` is blank.
    pub fn test_user(user_id: &str) -> AuthenticatedUser {
        let id = UserId::new(user_id).unwrap_or_else(|e| panic!("invalid test user id: {}", e));
        AuthenticatedUser::new(id, format!("{}@test.omnix.ai", user_id), UserRole::Staff)
    }

    /// Adds a valid token that maps to a user.
    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Adds a valid token for [`test_user`](Self::test_user).
    pub fn with_test_user(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let user = Self::test_user(&user_id.into());
        self.with_user(token, user)
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        *write(&self.force_error) = Some(error);
        self
    }

    /// Delays every answer, to exercise handshake timeouts.
    pub fn with_delay(self, delay: Duration) -> Self {
        *write(&self.delay) = Some(delay);
        self
    }

    /// Clears the forced error and returns to normal operation.
    pub fn clear_error(&self) {
        *write(&self.force_error) = None;
    }

    /// Registers a new valid token at runtime.
    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        write(&self.tokens).insert(token.into(), user);
    }

    /// Removes a token, making it invalid.
    pub fn remove_token(&self, token: &str) {
        write(&self.tokens).remove(token);
    }

    /// Returns the number of registered valid tokens.
    pub fn token_count(&self) -> usize {
        read(&self.tokens).len()
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let delay = *read(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = read(&self.force_error).clone() {
            return Err(error);
        }

        read(&self.tokens)
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn validates_registered_token() {
        let validator = MockSessionValidator::new().with_test_user("token-1", "user-1");

        let user = validator.validate("token-1").await.unwrap();
        assert_eq!(user.id.as_str(), "user-1");
        assert_eq!(user.email, "user-1@test.omnix.ai");
        assert_eq!(user.role, UserRole::Staff);
    }

    #[tokio::test]
    async fn rejects_unknown_token() {
        let validator = MockSessionValidator::new();
        assert_eq!(validator.validate("nope").await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn forced_error_overrides_tokens() {
        let validator = MockSessionValidator::new()
            .with_test_user("token-1", "user-1")
            .with_error(AuthError::TokenExpired);

        assert_eq!(validator.validate("token-1").await, Err(AuthError::TokenExpired));

        validator.clear_error();
        assert!(validator.validate("token-1").await.is_ok());
    }

    #[tokio::test]
    async fn tokens_can_be_added_and_removed_at_runtime() {
        let validator = MockSessionValidator::new();
        validator.add_token("t", MockSessionValidator::test_user("u"));
        assert_eq!(validator.token_count(), 1);

        validator.remove_token("t");
        assert_eq!(validator.token_count(), 0);
        assert!(validator.validate("t").await.is_err());
    }
}

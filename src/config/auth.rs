//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Shortest HS256 secret accepted in production.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Authentication configuration (HS256 bearer tokens)
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 signing secret
    pub jwt_secret: SecretString,

    /// Expected `iss` claim, if enforced
    pub issuer: Option<String>,

    /// Expected `aud` claim, if enforced
    pub audience: Option<String>,

    /// Upper bound on token verification during the handshake
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_ms: u64,

    /// Allowed clock skew when checking `exp`
    #[serde(default)]
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Creates a config with the given secret and defaults elsewhere.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: SecretString::new(secret.into()),
            issuer: None,
            audience: None,
            handshake_timeout_ms: default_handshake_timeout(),
            leeway_secs: 0,
        }
    }

    /// Get handshake timeout as Duration
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Validate authentication configuration
    ///
    /// Production requires a secret of at least
    /// [`MIN_PRODUCTION_SECRET_LEN`] bytes.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret_len = self.jwt_secret.expose_secret().len();
        if secret_len == 0 {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if *environment == Environment::Production && secret_len < MIN_PRODUCTION_SECRET_LEN {
            return Err(ValidationError::JwtSecretTooShort {
                min: MIN_PRODUCTION_SECRET_LEN,
            });
        }
        if self.handshake_timeout_ms == 0 || self.handshake_timeout_ms > 60_000 {
            return Err(ValidationError::InvalidHandshakeTimeout);
        }
        Ok(())
    }
}

fn default_handshake_timeout() -> u64 {
    5000
}

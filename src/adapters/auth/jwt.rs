//! HS256 JWT adapter for handshake validation.
//!
//! Implements the `SessionValidator` port for tokens issued by the OMNIX
//! auth service with a shared secret. Validation checks:
//!
//! - **Signature**: HS256 with the configured secret
//! - **Expiry (exp)**: required, must be in the future
//! - **Issuer (iss)** / **Audience (aud)**: only when configured
//!
//! Claims are mapped to the domain `AuthenticatedUser`: `sub` becomes the
//! user id, `email` and `role` are carried through, `exp` becomes the expiry
//! that ends a live connection.
//!
//! # Example
//!
//! ```ignore
//! use omnix_realtime::adapters::auth::JwtSessionValidator;
//! use omnix_realtime::config::AuthConfig;
//!
//! let validator = JwtSessionValidator::from_config(&AuthConfig::with_secret("dev-secret"));
//! let user = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::foundation::{AuthError, AuthenticatedUser, Timestamp, UserId, UserRole};
use crate::ports::SessionValidator;

/// JWT claims carried by OMNIX access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - the user ID
    pub sub: String,

    /// User's email address
    #[serde(default)]
    pub email: Option<String>,

    /// Role name, e.g. `admin` or `staff`
    #[serde(default)]
    pub role: Option<String>,

    /// Expiry timestamp (Unix epoch seconds)
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl TokenClaims {
    /// Claims for `sub`, valid until `exp`.
    pub fn new(sub: impl Into<String>, email: impl Into<String>, role: &UserRole, exp: i64) -> Self {
        Self {
            sub: sub.into(),
            email: Some(email.into()),
            role: Some(role.as_str().to_string()),
            exp,
            iat: Some(Timestamp::now().as_unix_secs()),
            iss: None,
            aud: None,
        }
    }
}

/// Validates HS256 tokens signed with a shared secret.
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    /// Builds a validator from the auth section of the configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);

        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            encoding_key: EncodingKey::from_secret(secret),
            validation,
        }
    }

    /// Signs claims with the configured secret.
    ///
    /// Used by tooling and tests; the auth service issues production tokens.
    pub fn issue(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            AuthError::service_unavailable("token signing failed")
        })
    }

    fn decode_claims(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidIssuer => {
                        tracing::warn!("Invalid issuer in token");
                        AuthError::InvalidToken
                    }
                    ErrorKind::InvalidAudience => {
                        tracing::warn!("Invalid audience in token");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::warn!("Token validation failed: {}", e);
                        AuthError::InvalidToken
                    }
                }
            })
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.decode_claims(token)?;

        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Invalid user ID in token: {:?}", claims.sub);
            AuthError::InvalidToken
        })?;

        let expires_at = Timestamp::from_unix_secs(claims.exp).ok_or_else(|| {
            tracing::warn!("Unrepresentable exp claim: {}", claims.exp);
            AuthError::InvalidToken
        })?;

        let role = claims
            .role
            .as_deref()
            .map(UserRole::parse)
            .unwrap_or_default();

        Ok(AuthenticatedUser::new(user_id, claims.email.unwrap_or_default(), role).with_expiry(expires_at))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("algorithm", &"HS256")
            .field("issuer", &self.validation.iss)
            .field("audience", &self.validation.aud)
            .finish_non_exhaustive()
    }
}

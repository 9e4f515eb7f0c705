//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("JWT secret must be at least {min} bytes in production")]
    JwtSecretTooShort { min: usize },

    #[error("Handshake timeout must be between 1 and 60000 ms")]
    InvalidHandshakeTimeout,

    #[error("Outbound buffer must be between 1 and 65536 messages")]
    InvalidOutboundBuffer,

    #[error("Subscription limit must allow at least the {min} default channels")]
    SubscriptionLimitTooLow { min: usize },
}

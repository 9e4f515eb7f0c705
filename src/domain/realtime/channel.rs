//! Channel names connections can subscribe to.
//!
//! A channel is either one of the fixed topics or a parameterized topic
//! scoped to a product or a user:
//!
//! ```text
//! products   dashboard   alerts   orders   recommendations   system   global
//! product.{productId}    user.{userId}
//! ```
//!
//! Client-supplied names are parsed into [`Channel`] before they reach the
//! subscription table, so unknown topics never get stored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::UserId;

/// Longest accepted parameter in `product.{id}` / `user.{id}`.
pub const MAX_CHANNEL_PARAM_LEN: usize = UserId::MAX_LEN;

const PRODUCT_PREFIX: &str = "product.";
const USER_PREFIX: &str = "user.";

/// Longest channel name that can parse successfully.
pub const MAX_CHANNEL_NAME_LEN: usize = PRODUCT_PREFIX.len() + MAX_CHANNEL_PARAM_LEN;

/// A logical topic name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Channel {
    Products,
    Product(String),
    Dashboard,
    Alerts,
    Orders,
    Recommendations,
    System,
    /// Reserved channel every connection joins at handshake.
    Global,
    User(String),
}

/// Reasons a channel name is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Channel name cannot be empty")]
    Empty,

    #[error("Unknown channel '{0}'")]
    Unknown(String),

    #[error("Invalid channel parameter in '{channel}': {reason}")]
    InvalidParameter { channel: String, reason: &'static str },
}

impl Channel {
    /// Channel for a single product's updates.
    pub fn product(product_id: impl Into<String>) -> Self {
        Channel::Product(product_id.into())
    }

    /// Private channel of a user.
    pub fn user(user_id: &UserId) -> Self {
        Channel::User(user_id.as_str().to_string())
    }

    /// Returns true for the parameterized variants.
    pub fn is_parameterized(&self) -> bool {
        matches!(self, Channel::Product(_) | Channel::User(_))
    }

    /// Returns the fixed name, or `None` for parameterized channels.
    fn fixed_name(&self) -> Option<&'static str> {
        Some(match self {
            Channel::Products => "products",
            Channel::Dashboard => "dashboard",
            Channel::Alerts => "alerts",
            Channel::Orders => "orders",
            Channel::Recommendations => "recommendations",
            Channel::System => "system",
            Channel::Global => "global",
            Channel::Product(_) | Channel::User(_) => return None,
        })
    }
}

fn validate_param(channel: &str, param: &str) -> Result<String, ChannelError> {
    if param.is_empty() {
        return Err(ChannelError::InvalidParameter {
            channel: channel.to_string(),
            reason: "parameter is empty",
        });
    }
    if param.len() > MAX_CHANNEL_PARAM_LEN {
        return Err(ChannelError::InvalidParameter {
            channel: channel.chars().take(64).collect(),
            reason: "parameter is too long",
        });
    }
    // Same rule UserId enforces, so every user channel the server builds parses back.
    if param.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ChannelError::InvalidParameter {
            channel: channel.to_string(),
            reason: "parameter contains whitespace or control characters",
        });
    }
    Ok(param.to_string())
}

impl FromStr for Channel {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(ChannelError::Empty),
            "products" => Ok(Channel::Products),
            "dashboard" => Ok(Channel::Dashboard),
            "alerts" => Ok(Channel::Alerts),
            "orders" => Ok(Channel::Orders),
            "recommendations" => Ok(Channel::Recommendations),
            "system" => Ok(Channel::System),
            "global" => Ok(Channel::Global),
            _ => {
                if let Some(param) = s.strip_prefix(PRODUCT_PREFIX) {
                    validate_param(s, param).map(Channel::Product)
                } else if let Some(param) = s.strip_prefix(USER_PREFIX) {
                    validate_param(s, param).map(Channel::User)
                } else {
                    Err(ChannelError::Unknown(s.chars().take(64).collect()))
                }
            }
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Product(id) => write!(f, "{}{}", PRODUCT_PREFIX, id),
            Channel::User(id) => write!(f, "{}{}", USER_PREFIX, id),
            fixed => f.write_str(fixed.fixed_name().unwrap_or_default()),
        }
    }
}

impl TryFrom<String> for Channel {
    type Error = ChannelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.to_string()
    }
}

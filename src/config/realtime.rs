//! Realtime fan-out configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Channels every connection joins at handshake (`global` and `user.{id}`).
pub const DEFAULT_CHANNELS_PER_CONNECTION: usize = 2;

/// Per-connection queueing and subscription limits
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound queue
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Most channels a single connection may subscribe to
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_connection: usize,
}

impl RealtimeConfig {
    /// Validate realtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.outbound_buffer == 0 || self.outbound_buffer > 65_536 {
            return Err(ValidationError::InvalidOutboundBuffer);
        }
        if self.max_subscriptions_per_connection < DEFAULT_CHANNELS_PER_CONNECTION {
            return Err(ValidationError::SubscriptionLimitTooLow {
                min: DEFAULT_CHANNELS_PER_CONNECTION,
            });
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
            max_subscriptions_per_connection: default_max_subscriptions(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_max_subscriptions() -> usize {
    64
}

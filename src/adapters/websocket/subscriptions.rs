//! Channel subscription table.
//!
//! Kept as two maps under one lock so that "who listens on this channel"
//! (every broadcast) and "what does this connection listen on" (cleanup on
//! disconnect) are both O(1) and never disagree.
//!
//! ```text
//! by_channel                         by_connection
//! products  ──▶ {conn-a, conn-b}     conn-a ──▶ {global, user.u1, products}
//! product.p1 ─▶ {conn-b}             conn-b ──▶ {global, user.u2, products, product.p1}
//! ```

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::Channel;

/// Default cap on channels per connection.
pub const DEFAULT_MAX_SUBSCRIPTIONS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("Subscription limit of {limit} channels reached")]
    LimitReached { limit: usize },
}

#[derive(Debug, Default)]
struct Tables {
    by_channel: HashMap<Channel, HashSet<ConnectionId>>,
    by_connection: HashMap<ConnectionId, HashSet<Channel>>,
}

/// Maps channels to subscribed connections and back.
#[derive(Debug)]
pub struct SubscriptionTable {
    tables: RwLock<Tables>,
    max_per_connection: usize,
}

impl SubscriptionTable {
    pub fn new(max_per_connection: usize) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            max_per_connection,
        }
    }

    pub fn max_per_connection(&self) -> usize {
        self.max_per_connection
    }

    /// Adds `connection` to `channel`.
    ///
    /// Idempotent: returns `Ok(false)` if it was already subscribed. A new
    /// subscription beyond the per-connection cap is refused.
    pub async fn subscribe(
        &self,
        connection: ConnectionId,
        channel: Channel,
    ) -> Result<bool, SubscriptionError> {
        let mut tables = self.tables.write().await;

        let current = tables.by_connection.entry(connection).or_default();
        if current.contains(&channel) {
            return Ok(false);
        }
        if current.len() >= self.max_per_connection {
            return Err(SubscriptionError::LimitReached {
                limit: self.max_per_connection,
            });
        }
        current.insert(channel.clone());

        tables
            .by_channel
            .entry(channel)
            .or_default()
            .insert(connection);
        Ok(true)
    }

    /// Removes `connection` from `channel`. Returns whether it was subscribed.
    pub async fn unsubscribe(&self, connection: &ConnectionId, channel: &Channel) -> bool {
        let mut tables = self.tables.write().await;

        let removed = match tables.by_connection.get_mut(connection) {
            Some(channels) => {
                let removed = channels.remove(channel);
                if channels.is_empty() {
                    tables.by_connection.remove(connection);
                }
                removed
            }
            None => false,
        };

        if removed {
            if let Some(members) = tables.by_channel.get_mut(channel) {
                members.remove(connection);
                if members.is_empty() {
                    tables.by_channel.remove(channel);
                }
            }
        }
        removed
    }

    /// Drops every subscription held by `connection` and returns the purged
    /// channels.
    pub async fn remove_connection(&self, connection: &ConnectionId) -> Vec<Channel> {
        let mut tables = self.tables.write().await;

        let Some(channels) = tables.by_connection.remove(connection) else {
            return Vec::new();
        };
        for channel in &channels {
            if let Some(members) = tables.by_channel.get_mut(channel) {
                members.remove(connection);
                if members.is_empty() {
                    tables.by_channel.remove(channel);
                }
            }
        }
        let mut purged: Vec<Channel> = channels.into_iter().collect();
        purged.sort();
        purged
    }

    /// Connections subscribed to `channel` right now.
    pub async fn subscribers_of(&self, channel: &Channel) -> Vec<ConnectionId> {
        self.tables
            .read()
            .await
            .by_channel
            .get(channel)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Channels `connection` is subscribed to, sorted.
    pub async fn channels_of(&self, connection: &ConnectionId) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self
            .tables
            .read()
            .await
            .by_connection
            .get(connection)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        channels.sort();
        channels
    }

    pub async fn is_subscribed(&self, connection: &ConnectionId, channel: &Channel) -> bool {
        self.tables
            .read()
            .await
            .by_channel
            .get(channel)
            .is_some_and(|members| members.contains(connection))
    }

    /// Channels with at least one subscriber, with their subscriber counts.
    pub async fn active_channels(&self) -> Vec<(Channel, usize)> {
        let mut channels: Vec<(Channel, usize)> = self
            .tables
            .read()
            .await
            .by_channel
            .iter()
            .map(|(channel, members)| (channel.clone(), members.len()))
            .collect();
        channels.sort();
        channels
    }
}

impl Default for SubscriptionTable {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUBSCRIPTIONS)
    }
}

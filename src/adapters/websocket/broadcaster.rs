//! Fan-out of envelopes to channel subscribers.
//!
//! # Event Flow
//!
//! ```text
//! domain service ──emit_*──▶ EventBroadcaster
//!                                 │ subscribers_of(channel)
//!                                 ▼
//!                          SubscriptionTable
//!                                 │ handles(ids)
//!                                 ▼
//!                          ConnectionRegistry ──try_send──▶ per-connection queue
//! ```
//!
//! Delivery is a non-blocking enqueue per subscriber. A full or closed queue
//! only costs that subscriber the message; it is logged and counted, and the
//! caller never sees an error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::{ConnectionId, UserId};
use crate::domain::realtime::{Channel, RealtimeEvent};
use crate::ports::RealtimePublisher;

use super::messages::Envelope;
use super::registry::{try_deliver, ConnectionHandle, ConnectionRegistry, DeliveryError};
use super::subscriptions::SubscriptionTable;

/// Point-in-time delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStats {
    /// Envelopes emitted on a channel (one per channel per emit).
    pub emitted: u64,
    /// Envelopes accepted into an outbound queue.
    pub delivered: u64,
    /// Envelopes lost to a full or closed queue.
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    emitted: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Delivers envelopes to subscribed connections.
pub struct EventBroadcaster {
    registry: Arc<ConnectionRegistry>,
    subscriptions: Arc<SubscriptionTable>,
    counters: Counters,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, subscriptions: Arc<SubscriptionTable>) -> Self {
        Self {
            registry,
            subscriptions,
            counters: Counters::default(),
        }
    }

    /// Sends a message to every connection subscribed to `channel`.
    ///
    /// Returns how many subscribers accepted it.
    pub async fn emit(&self, channel: &Channel, message_type: &str, payload: Value) -> usize {
        let envelope = Envelope::new(channel.to_string(), message_type, payload);
        self.emit_envelope(channel, envelope).await
    }

    /// Sends to every connection; all of them joined `global` at handshake.
    pub async fn emit_to_all(&self, message_type: &str, payload: Value) -> usize {
        self.emit(&Channel::Global, message_type, payload).await
    }

    /// Sends to every connection of one user via their private channel.
    pub async fn emit_to_user(&self, user_id: &UserId, message_type: &str, payload: Value) -> usize {
        self.emit(&Channel::user(user_id), message_type, payload).await
    }

    /// Sends a direct reply to a single connection, bypassing subscriptions.
    pub async fn send_to_connection(
        &self,
        connection_id: &ConnectionId,
        envelope: Envelope,
    ) -> Result<(), DeliveryError> {
        let Some(sender) = self.registry.sender(connection_id).await else {
            tracing::debug!(
                connection_id = %connection_id,
                message_type = %envelope.message_type,
                "Direct message for unknown connection discarded"
            );
            return Err(DeliveryError::UnknownConnection);
        };

        let message_type = envelope.message_type.clone();
        let result = try_deliver(&sender, Arc::new(envelope));
        match result {
            Ok(()) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    connection_id = %connection_id,
                    message_type = %message_type,
                    error = %e,
                    "Direct message dropped"
                );
            }
        }
        result
    }

    /// Publishes a domain event on each of its channels.
    pub async fn publish_event(&self, event: &RealtimeEvent) -> usize {
        let mut delivered = 0;
        for channel in event.channels() {
            let envelope = Envelope::for_event(&channel, event);
            delivered += self.emit_envelope(&channel, envelope).await;
        }
        delivered
    }

    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            emitted: self.counters.emitted.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    async fn emit_envelope(&self, channel: &Channel, envelope: Envelope) -> usize {
        self.counters.emitted.fetch_add(1, Ordering::Relaxed);

        let subscribers = self.subscriptions.subscribers_of(channel).await;
        if subscribers.is_empty() {
            tracing::trace!(channel = %channel, message_type = %envelope.message_type, "No subscribers");
            return 0;
        }

        let handles = self.registry.handles(&subscribers).await;
        let envelope = Arc::new(envelope);
        let delivered = self.deliver_all(channel, &handles, &envelope);

        tracing::debug!(
            channel = %channel,
            message_type = %envelope.message_type,
            subscribers = subscribers.len(),
            delivered,
            "Broadcast"
        );
        delivered
    }

    fn deliver_all(
        &self,
        channel: &Channel,
        handles: &[ConnectionHandle],
        envelope: &Arc<Envelope>,
    ) -> usize {
        let mut delivered = 0;
        for handle in handles {
            match handle.deliver(Arc::clone(envelope)) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        connection_id = %handle.id(),
                        channel = %channel,
                        message_type = %envelope.message_type,
                        error = %e,
                        "Delivery to subscriber failed"
                    );
                }
            }
        }
        self.counters
            .delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }
}

#[async_trait]
impl RealtimePublisher for EventBroadcaster {
    /// Publishes the event, then any alert it implies, exactly once.
    async fn publish(&self, event: RealtimeEvent) {
        self.publish_event(&event).await;

        if let Some(alert) = event.derived_alert() {
            tracing::info!(
                event_type = event.event_type(),
                "Stock at or below minimum; raising alert"
            );
            self.publish_event(&alert).await;
        }
    }
}

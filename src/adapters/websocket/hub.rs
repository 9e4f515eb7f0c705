//! The realtime hub: one explicit object owning every shared structure.
//!
//! ```text
//!                    ┌──────────────── RealtimeHub ────────────────┐
//! handshake ───────▶ │ HandshakeGate                                │
//! client frames ───▶ │ dispatch ──▶ SubscriptionTable               │
//!                    │          └─▶ SnapshotResponder ─┐            │
//! domain services ─▶ │ EventBroadcaster ◀──────────────┘            │
//!                    │        └──▶ ConnectionRegistry ──▶ queues    │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! Constructed once at startup and shared by `Arc`; tests build their own.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, RealtimeConfig};
use crate::domain::foundation::{AuthenticatedUser, ConnectionId};
use crate::domain::realtime::{Channel, ConnectionInfo, TerminationCause, MAX_CHANNEL_NAME_LEN};
use crate::ports::{AlertSource, DashboardMetricsSource, RealtimePublisher, SessionValidator};

use super::broadcaster::EventBroadcaster;
use super::gate::HandshakeGate;
use super::messages::{error_codes, ClientMessage, Envelope};
use super::registry::{outbound_queue, ConnectionHandle, ConnectionRegistry, OutboundReceiver};
use super::snapshots::SnapshotResponder;
use super::subscriptions::{SubscriptionError, SubscriptionTable};

/// Limits applied to every connection.
#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    pub outbound_buffer: usize,
    pub max_subscriptions_per_connection: usize,
    pub handshake_timeout: Duration,
}

impl HubSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            outbound_buffer: config.realtime.outbound_buffer,
            max_subscriptions_per_connection: config.realtime.max_subscriptions_per_connection,
            handshake_timeout: config.auth.handshake_timeout(),
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        let realtime = RealtimeConfig::default();
        Self {
            outbound_buffer: realtime.outbound_buffer,
            max_subscriptions_per_connection: realtime.max_subscriptions_per_connection,
            handshake_timeout: Duration::from_millis(5000),
        }
    }
}

/// A connection that passed the handshake.
pub struct AdmittedConnection {
    pub info: ConnectionInfo,
    /// Outbound queue for the connection's writer task.
    pub outbound: OutboundReceiver,
}

pub struct RealtimeHub {
    registry: Arc<ConnectionRegistry>,
    subscriptions: Arc<SubscriptionTable>,
    broadcaster: Arc<EventBroadcaster>,
    snapshots: SnapshotResponder,
    gate: HandshakeGate,
    settings: HubSettings,
}

impl RealtimeHub {
    pub fn new(
        settings: HubSettings,
        validator: Arc<dyn SessionValidator>,
        metrics: Arc<dyn DashboardMetricsSource>,
        alerts: Arc<dyn AlertSource>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let subscriptions = Arc::new(SubscriptionTable::new(
            settings.max_subscriptions_per_connection,
        ));
        let broadcaster = Arc::new(EventBroadcaster::new(
            registry.clone(),
            subscriptions.clone(),
        ));
        let snapshots = SnapshotResponder::new(broadcaster.clone(), metrics, alerts);
        let gate = HandshakeGate::new(validator, settings.handshake_timeout);

        Self {
            registry,
            subscriptions,
            broadcaster,
            snapshots,
            gate,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn subscriptions(&self) -> &Arc<SubscriptionTable> {
        &self.subscriptions
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    /// The broadcaster behind the port domain services publish through.
    pub fn publisher(&self) -> Arc<dyn RealtimePublisher> {
        self.broadcaster.clone()
    }

    pub fn snapshots(&self) -> &SnapshotResponder {
        &self.snapshots
    }

    pub fn gate(&self) -> &HandshakeGate {
        &self.gate
    }

    /// Registers an authenticated user's connection.
    ///
    /// The connection joins `global` and its user channel, and the first
    /// message in its queue is `connection.established`.
    pub async fn admit(&self, user: &AuthenticatedUser) -> AdmittedConnection {
        let id = ConnectionId::new();
        let info = ConnectionInfo::for_user(id, user);
        let (sender, outbound) = outbound_queue(self.settings.outbound_buffer);

        self.registry
            .register(ConnectionHandle::new(info.clone(), sender))
            .await;

        let defaults = [Channel::Global, Channel::user(&user.id)];
        for channel in &defaults {
            if let Err(e) = self.subscriptions.subscribe(id, channel.clone()).await {
                tracing::error!(connection_id = %id, channel = %channel, error = %e, "Default subscription refused");
            }
        }

        let _ = self
            .broadcaster
            .send_to_connection(&id, Envelope::connection_established(id, &user.id, &defaults))
            .await;

        tracing::info!(
            connection_id = %id,
            user_id = %user.id,
            role = %user.role,
            "Client connected"
        );

        AdmittedConnection { info, outbound }
    }

    /// Handles one text frame from a client.
    pub async fn handle_text(&self, connection_id: &ConnectionId, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.dispatch(connection_id, message).await,
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "Unparseable client message");
                self.reply(
                    connection_id,
                    Envelope::error(
                        Channel::System.to_string(),
                        error_codes::INVALID_MESSAGE,
                        "Message must be a JSON object with a known \"type\"",
                    ),
                )
                .await;
            }
        }
    }

    /// Applies a parsed client message.
    pub async fn dispatch(&self, connection_id: &ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::Subscribe { channel } => self.subscribe(connection_id, &channel).await,
            ClientMessage::Unsubscribe { channel } => {
                self.unsubscribe(connection_id, &channel).await
            }
            ClientMessage::GetDashboardMetrics => {
                self.snapshots
                    .respond_with_dashboard_metrics(connection_id)
                    .await
            }
            ClientMessage::GetCurrentAlerts => {
                self.snapshots
                    .respond_with_current_alerts(connection_id)
                    .await
            }
            ClientMessage::Ping => self.reply(connection_id, Envelope::pong()).await,
        }
    }

    /// Removes a connection and every subscription it held.
    pub async fn terminate(&self, connection_id: &ConnectionId, cause: TerminationCause) {
        let removed = self.registry.unregister(connection_id).await;
        let purged = self.subscriptions.remove_connection(connection_id).await;

        if let Some(handle) = removed {
            tracing::info!(
                connection_id = %connection_id,
                user_id = %handle.info.user_id,
                cause = %cause,
                channels = purged.len(),
                "Client disconnected"
            );
        }
    }

    async fn subscribe(&self, connection_id: &ConnectionId, raw: &str) {
        if !self.registry.contains(connection_id).await {
            tracing::debug!(connection_id = %connection_id, channel = raw, "Subscribe from unregistered connection ignored");
            return;
        }

        let channel = match self.authorized_channel(connection_id, raw).await {
            Ok(channel) => channel,
            Err(reply) => return self.reply(connection_id, reply).await,
        };

        let reply = match self.subscriptions.subscribe(*connection_id, channel.clone()).await {
            Ok(_) => {
                tracing::debug!(connection_id = %connection_id, channel = %channel, "Subscribed");
                Envelope::subscription_confirmed(&channel)
            }
            Err(SubscriptionError::LimitReached { limit }) => Envelope::error(
                channel.to_string(),
                error_codes::SUBSCRIPTION_LIMIT,
                format!("At most {} channels per connection", limit),
            ),
        };
        self.reply(connection_id, reply).await;
    }

    async fn unsubscribe(&self, connection_id: &ConnectionId, raw: &str) {
        let channel = match raw.parse::<Channel>() {
            Ok(channel) => channel,
            Err(e) => return self.reply(connection_id, invalid_channel(raw, &e.to_string())).await,
        };

        if self.subscriptions.unsubscribe(connection_id, &channel).await {
            tracing::debug!(connection_id = %connection_id, channel = %channel, "Unsubscribed");
        }
        self.reply(connection_id, Envelope::subscription_removed(&channel))
            .await;
    }

    /// Parses a requested channel; a user channel must be the caller's own.
    async fn authorized_channel(
        &self,
        connection_id: &ConnectionId,
        raw: &str,
    ) -> Result<Channel, Envelope> {
        let channel = raw
            .parse::<Channel>()
            .map_err(|e| invalid_channel(raw, &e.to_string()))?;

        if let Channel::User(owner) = &channel {
            let caller = self.registry.get(connection_id).await;
            if caller.map_or(true, |info| info.user_id.as_str() != owner) {
                tracing::warn!(connection_id = %connection_id, channel = %channel, "Subscription to another user's channel refused");
                return Err(invalid_channel(raw, "user channels are private to their owner"));
            }
        }
        Ok(channel)
    }

    async fn reply(&self, connection_id: &ConnectionId, envelope: Envelope) {
        let _ = self
            .broadcaster
            .send_to_connection(connection_id, envelope)
            .await;
    }
}

/// Echoes the requested name back unless it is empty or longer than any
/// name that could have parsed.
fn invalid_channel(raw: &str, reason: &str) -> Envelope {
    let channel = if raw.is_empty() || raw.len() > MAX_CHANNEL_NAME_LEN {
        Channel::System.to_string()
    } else {
        raw.to_string()
    };
    Envelope::error(channel, error_codes::INVALID_CHANNEL, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::snapshot::InMemoryInventorySnapshot;

    fn hub_with_limit(max_subscriptions_per_connection: usize) -> RealtimeHub {
        let source = Arc::new(InMemoryInventorySnapshot::new());
        RealtimeHub::new(
            HubSettings {
                max_subscriptions_per_connection,
                ..HubSettings::default()
            },
            Arc::new(MockSessionValidator::new()),
            source.clone(),
            source,
        )
    }

    fn hub() -> RealtimeHub {
        hub_with_limit(64)
    }

    async fn admit(hub: &RealtimeHub, user: &str) -> AdmittedConnection {
        hub.admit(&MockSessionValidator::test_user(user)).await
    }

    fn next(conn: &mut AdmittedConnection) -> Arc<Envelope> {
        conn.outbound.try_recv().expect("expected a queued message")
    }

    #[tokio::test]
    async fn admit_registers_and_joins_default_channels() {
        let hub = hub();
        let mut conn = admit(&hub, "u-1").await;

        assert_eq!(hub.registry().count().await, 1);
        assert_eq!(
            hub.subscriptions().channels_of(&conn.info.id).await,
            vec![Channel::Global, Channel::User("u-1".into())]
        );

        let welcome = next(&mut conn);
        assert_eq!(welcome.message_type, "connection.established");
        assert_eq!(welcome.channel, "system");
        assert_eq!(welcome.payload["connectionId"], conn.info.id.to_string());
    }

    #[tokio::test]
    async fn subscribe_confirms_and_stores() {
        let hub = hub();
        let mut conn = admit(&hub, "u-1").await;
        let _ = next(&mut conn);

        hub.handle_text(&conn.info.id, r#"{"type":"subscribe","channel":"products"}"#)
            .await;

        let reply = next(&mut conn);
        assert_eq!(reply.message_type, "subscription.confirmed");
        assert_eq!(reply.channel, "products");
        assert!(hub
            .subscriptions()
            .is_subscribed(&conn.info.id, &Channel::Products)
            .await);
    }

    #[tokio::test]
    async fn invalid_channel_gets_targeted_error_and_is_not_stored() {
        let hub = hub();
        let mut conn = admit(&hub, "u-1").await;
        let _ = next(&mut conn);

        hub.handle_text(&conn.info.id, r#"{"type":"subscribe","channel":"warehouse"}"#)
            .await;

        let reply = next(&mut conn);
        assert!(reply.is_error());
        assert_eq!(reply.channel, "warehouse");
        assert_eq!(reply.payload["code"], "INVALID_CHANNEL");
        assert_eq!(hub.subscriptions().channels_of(&conn.info.id).await.len(), 2);
    }

    #[tokio::test]
    async fn other_users_channel_is_refused() {
        let hub = hub();
        let mut conn = admit(&hub, "u-1").await;
        let _ = next(&mut conn);

        hub.handle_text(&conn.info.id, r#"{"type":"subscribe","channel":"user.u-2"}"#)
            .await;

        assert_eq!(next(&mut conn).payload["code"], "INVALID_CHANNEL");
        assert!(!hub
            .subscriptions()
            .is_subscribed(&conn.info.id, &Channel::User("u-2".into()))
            .await);
    }

    #[tokio::test]
    async fn subscription_limit_is_reported() {
        let hub = hub_with_limit(3);
        let mut conn = admit(&hub, "u-1").await;
        let _ = next(&mut conn);

        hub.dispatch(&conn.info.id, ClientMessage::Subscribe { channel: "products".into() })
            .await;
        hub.dispatch(&conn.info.id, ClientMessage::Subscribe { channel: "alerts".into() })
            .await;

        assert_eq!(next(&mut conn).message_type, "subscription.confirmed");
        let refused = next(&mut conn);
        assert_eq!(refused.channel, "alerts");
        assert_eq!(refused.payload["code"], "SUBSCRIPTION_LIMIT");
    }

    #[tokio::test]
    async fn unsubscribe_acknowledges_even_when_absent() {
        let hub = hub();
        let mut conn = admit(&hub, "u-1").await;
        let _ = next(&mut conn);

        hub.handle_text(&conn.info.id, r#"{"type":"unsubscribe","channel":"orders"}"#)
            .await;

        let reply = next(&mut conn);
        assert_eq!(reply.message_type, "subscription.removed");
        assert_eq!(reply.channel, "orders");
    }

    #[tokio::test]
    async fn email_style_user_can_manage_own_channel() {
        let hub = hub();
        let mut conn = admit(&hub, "jane.doe@omnix.ai").await;

        let welcome = next(&mut conn);
        assert_eq!(
            welcome.payload["channels"],
            serde_json::json!(["global", "user.jane.doe@omnix.ai"])
        );

        hub.handle_text(
            &conn.info.id,
            r#"{"type":"unsubscribe","channel":"user.jane.doe@omnix.ai"}"#,
        )
        .await;
        let removed = next(&mut conn);
        assert_eq!(removed.message_type, "subscription.removed");
        assert_eq!(removed.channel, "user.jane.doe@omnix.ai");

        hub.handle_text(
            &conn.info.id,
            r#"{"type":"subscribe","channel":"user.jane.doe@omnix.ai"}"#,
        )
        .await;
        assert_eq!(next(&mut conn).message_type, "subscription.confirmed");
        assert!(hub
            .subscriptions()
            .is_subscribed(&conn.info.id, &Channel::User("jane.doe@omnix.ai".into()))
            .await);
    }

    #[tokio::test]
    async fn subscribe_after_terminate_stores_nothing() {
        let hub = hub();
        let conn = admit(&hub, "u-1").await;
        let id = conn.info.id;

        hub.terminate(&id, TerminationCause::ClientDisconnect).await;
        hub.dispatch(&id, ClientMessage::Subscribe { channel: "products".into() })
            .await;
        hub.handle_text(&ConnectionId::new(), r#"{"type":"subscribe","channel":"alerts"}"#)
            .await;

        assert_eq!(hub.registry().count().await, 0);
        assert!(hub.subscriptions().channels_of(&id).await.is_empty());
        assert!(hub
            .subscriptions()
            .subscribers_of(&Channel::Products)
            .await
            .is_empty());
        assert!(hub
            .subscriptions()
            .active_channels()
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn overlong_invalid_name_is_reported_on_system() {
        let hub = hub();
        let mut conn = admit(&hub, "u-1").await;
        let _ = next(&mut conn);

        let raw = format!("product.{}", "x".repeat(MAX_CHANNEL_NAME_LEN));
        hub.dispatch(&conn.info.id, ClientMessage::Subscribe { channel: raw })
            .await;

        let reply = next(&mut conn);
        assert_eq!(reply.channel, "system");
        assert_eq!(reply.payload["code"], "INVALID_CHANNEL");
    }

    #[tokio::test]
    async fn ping_gets_pong() {
        let hub = hub();
        let mut conn = admit(&hub, "u-1").await;
        let _ = next(&mut conn);

        hub.handle_text(&conn.info.id, r#"{"type":"ping"}"#).await;

        let reply = next(&mut conn);
        assert_eq!(reply.message_type, "pong");
        assert_eq!(reply.channel, "system");
    }

    #[tokio::test]
    async fn garbage_gets_invalid_message() {
        let hub = hub();
        let mut conn = admit(&hub, "u-1").await;
        let _ = next(&mut conn);

        hub.handle_text(&conn.info.id, "{not json").await;

        let reply = next(&mut conn);
        assert_eq!(reply.channel, "system");
        assert_eq!(reply.payload["code"], "INVALID_MESSAGE");
    }

    #[tokio::test]
    async fn terminate_purges_registry_and_subscriptions() {
        let hub = hub();
        let conn = admit(&hub, "u-1").await;
        let id = conn.info.id;
        hub.dispatch(&id, ClientMessage::Subscribe { channel: "products".into() })
            .await;

        hub.terminate(&id, TerminationCause::ClientDisconnect).await;

        assert_eq!(hub.registry().count().await, 0);
        assert!(hub.subscriptions().channels_of(&id).await.is_empty());
        assert!(hub
            .subscriptions()
            .subscribers_of(&Channel::Products)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn terminate_twice_is_harmless() {
        let hub = hub();
        let conn = admit(&hub, "u-1").await;

        hub.terminate(&conn.info.id, TerminationCause::TransportError).await;
        hub.terminate(&conn.info.id, TerminationCause::TransportError).await;

        assert_eq!(hub.registry().count().await, 0);
    }
}

//! Current-state snapshots pushed to a single requesting connection.
//!
//! A client that just opened the dashboard asks for the current numbers
//! instead of waiting for the next `metrics.updated` broadcast. Answers go
//! to the requester only and never create a subscription.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::{ConnectionId, Timestamp};
use crate::domain::realtime::{event_types, Channel};
use crate::ports::{AlertSource, DashboardMetricsSource};

use super::broadcaster::EventBroadcaster;
use super::messages::{error_codes, Envelope};

/// Answers `GET_DASHBOARD_METRICS` and `GET_CURRENT_ALERTS`.
pub struct SnapshotResponder {
    broadcaster: Arc<EventBroadcaster>,
    metrics: Arc<dyn DashboardMetricsSource>,
    alerts: Arc<dyn AlertSource>,
}

impl SnapshotResponder {
    pub fn new(
        broadcaster: Arc<EventBroadcaster>,
        metrics: Arc<dyn DashboardMetricsSource>,
        alerts: Arc<dyn AlertSource>,
    ) -> Self {
        Self {
            broadcaster,
            metrics,
            alerts,
        }
    }

    /// Sends `metrics.updated` on `dashboard` to one connection.
    pub async fn respond_with_dashboard_metrics(&self, connection_id: &ConnectionId) {
        let envelope = match self.metrics.current_metrics().await {
            Ok(mut metrics) => {
                metrics.generated_at.get_or_insert_with(Timestamp::now);
                Envelope::new(
                    Channel::Dashboard.to_string(),
                    event_types::METRICS_UPDATED,
                    json!(metrics),
                )
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "Dashboard metrics snapshot failed");
                Envelope::error(
                    Channel::Dashboard.to_string(),
                    error_codes::SNAPSHOT_FAILED,
                    "Failed to load dashboard metrics",
                )
            }
        };

        let _ = self.broadcaster.send_to_connection(connection_id, envelope).await;
    }

    /// Sends `alerts.current` on `alerts` to one connection.
    pub async fn respond_with_current_alerts(&self, connection_id: &ConnectionId) {
        let envelope = match self.alerts.active_alerts().await {
            Ok(alerts) => Envelope::new(
                Channel::Alerts.to_string(),
                event_types::ALERTS_CURRENT,
                json!({ "alerts": alerts, "count": alerts.len() }),
            ),
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "Current alerts snapshot failed");
                Envelope::error(
                    Channel::Alerts.to_string(),
                    error_codes::SNAPSHOT_FAILED,
                    "Failed to load current alerts",
                )
            }
        };

        let _ = self.broadcaster.send_to_connection(connection_id, envelope).await;
    }
}

//! In-memory inventory snapshot.
//!
//! Holds the latest dashboard metrics and the alert list. Used by the binary
//! as the cached view behind snapshot requests, and by tests, where a forced
//! failure exercises the error reply path.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::domain::inventory::{Alert, DashboardMetrics};
use crate::ports::{AlertSource, DashboardMetricsSource};

#[derive(Debug, Default)]
struct State {
    metrics: DashboardMetrics,
    alerts: Vec<Alert>,
    failure: Option<String>,
}

/// Cached inventory view implementing both snapshot ports.
#[derive(Debug, Default)]
pub struct InMemoryInventorySnapshot {
    state: RwLock<State>,
}

impl InMemoryInventorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current dashboard metrics.
    pub async fn set_metrics(&self, metrics: DashboardMetrics) {
        self.state.write().await.metrics = metrics;
    }

    /// Records a new alert.
    pub async fn push_alert(&self, alert: Alert) {
        self.state.write().await.alerts.push(alert);
    }

    /// Marks an alert acknowledged. Returns false if no alert has that id.
    pub async fn acknowledge(&self, alert_id: &str) -> bool {
        let mut state = self.state.write().await;
        match state.alerts.iter_mut().find(|a| a.id == alert_id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    /// Makes every read fail until [`clear_failure`](Self::clear_failure).
    pub async fn fail_with(&self, reason: impl Into<String>) {
        self.state.write().await.failure = Some(reason.into());
    }

    pub async fn clear_failure(&self) {
        self.state.write().await.failure = None;
    }

    fn check(state: &State) -> Result<(), DomainError> {
        match &state.failure {
            Some(reason) => Err(DomainError::unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DashboardMetricsSource for InMemoryInventorySnapshot {
    async fn current_metrics(&self) -> Result<DashboardMetrics, DomainError> {
        let state = self.state.read().await;
        Self::check(&state)?;

        let mut metrics = state.metrics.clone();
        metrics.active_alerts = state.alerts.iter().filter(|a| a.is_active()).count() as u64;
        Ok(metrics)
    }
}

#[async_trait]
impl AlertSource for InMemoryInventorySnapshot {
    /// Unacknowledged alerts, most severe first, newest first within a
    /// severity.
    async fn active_alerts(&self) -> Result<Vec<Alert>, DomainError> {
        let state = self.state.read().await;
        Self::check(&state)?;

        let mut alerts: Vec<Alert> = state
            .alerts
            .iter()
            .filter(|a| a.is_active())
            .cloned()
            .collect();
        alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::AlertSeverity;
    use crate::domain::foundation::ErrorCode;

    #[tokio::test]
    async fn starts_empty() {
        let source = InMemoryInventorySnapshot::new();
        assert_eq!(source.current_metrics().await.unwrap(), DashboardMetrics::default());
        assert!(source.active_alerts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn returns_latest_metrics_with_live_alert_count() {
        let source = InMemoryInventorySnapshot::new();
        source
            .set_metrics(DashboardMetrics {
                total_products: 120,
                low_stock_items: 3,
                ..Default::default()
            })
            .await;
        source.push_alert(Alert::low_stock("p1", "Oat Milk", 2, 5)).await;

        let metrics = source.current_metrics().await.unwrap();
        assert_eq!(metrics.total_products, 120);
        assert_eq!(metrics.active_alerts, 1);
    }

    #[tokio::test]
    async fn acknowledged_alerts_are_not_active() {
        let source = InMemoryInventorySnapshot::new();
        let alert = Alert::low_stock("p1", "Oat Milk", 2, 5);
        let id = alert.id.clone();
        source.push_alert(alert).await;

        assert!(source.acknowledge(&id).await);
        assert!(!source.acknowledge("alert-missing").await);
        assert!(source.active_alerts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn alerts_are_ordered_most_severe_first() {
        let source = InMemoryInventorySnapshot::new();
        source.push_alert(Alert::low_stock("p1", "Oat Milk", 2, 5)).await;
        source.push_alert(Alert::low_stock("p2", "Rye Bread", 0, 5)).await;

        let alerts = source.active_alerts().await.unwrap();
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[1].severity, AlertSeverity::Warning);
    }

    #[tokio::test]
    async fn forced_failure_fails_both_ports_until_cleared() {
        let source = InMemoryInventorySnapshot::new();
        source.fail_with("cache offline").await;

        let err = source.current_metrics().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
        assert!(source.active_alerts().await.is_err());

        source.clear_failure().await;
        assert!(source.current_metrics().await.is_ok());
    }
}

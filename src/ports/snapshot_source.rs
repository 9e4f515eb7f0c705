//! Snapshot source ports.
//!
//! Snapshot responders call these to compute the current state a client asks
//! for. The inventory services behind them are outside this crate; failures
//! come back as `DomainError` and are reported only to the requester.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::inventory::{Alert, DashboardMetrics};

/// Computes the current dashboard metrics.
#[async_trait]
pub trait DashboardMetricsSource: Send + Sync {
    async fn current_metrics(&self) -> Result<DashboardMetrics, DomainError>;
}

/// Lists the alerts that are still active.
#[async_trait]
pub trait AlertSource: Send + Sync {
    async fn active_alerts(&self) -> Result<Vec<Alert>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_ports_are_object_safe_and_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn DashboardMetricsSource>();
        assert_send_sync::<dyn AlertSource>();
    }
}

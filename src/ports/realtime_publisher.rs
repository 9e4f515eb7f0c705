//! RealtimePublisher port - what domain services call when state changes.
//!
//! Product, alert, order and system services depend on this trait rather than
//! on the WebSocket adapter. Every method is fire-and-forget: delivery
//! problems are handled inside the gateway and never reach the caller, so an
//! HTTP request that triggered the event is never failed by fan-out.
//!
//! # Example
//!
//! ```ignore
//! async fn adjust_stock(publisher: Arc<dyn RealtimePublisher>, product: &Product) {
//!     publisher
//!         .emit_stock_changed(&product.id, &product.name, product.stock, product.min_stock)
//!         .await;
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::inventory::{Alert, DashboardMetrics};
use crate::domain::realtime::RealtimeEvent;

/// Port for pushing domain events to realtime subscribers.
///
/// Implementors provide `publish`; the `emit_*` helpers build the matching
/// [`RealtimeEvent`] and forward it.
#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    /// Publish one typed event on all of its channels.
    async fn publish(&self, event: RealtimeEvent);

    async fn emit_product_update(&self, product_id: &str, data: Value) {
        self.publish(RealtimeEvent::ProductUpdated {
            product_id: product_id.to_string(),
            data,
        })
        .await
    }

    async fn emit_product_deleted(&self, product_id: &str) {
        self.publish(RealtimeEvent::ProductDeleted {
            product_id: product_id.to_string(),
        })
        .await
    }

    /// Publishes the stock change and, when `stock <= min_stock`, one
    /// low-stock alert on `alerts`.
    async fn emit_stock_changed(&self, product_id: &str, product_name: &str, stock: i64, min_stock: i64) {
        self.publish(RealtimeEvent::StockChanged {
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            stock,
            min_stock,
        })
        .await
    }

    async fn emit_dashboard_update(&self, metrics: DashboardMetrics) {
        self.publish(RealtimeEvent::DashboardUpdated(metrics)).await
    }

    async fn emit_new_alert(&self, alert: Alert) {
        self.publish(RealtimeEvent::AlertCreated(alert)).await
    }

    async fn emit_alert_update(&self, alert_id: &str, patch: Value) {
        self.publish(RealtimeEvent::AlertUpdated {
            alert_id: alert_id.to_string(),
            patch,
        })
        .await
    }

    async fn emit_new_order(&self, order: Value) {
        self.publish(RealtimeEvent::OrderCreated(order)).await
    }

    async fn emit_order_status_changed(&self, order_id: &str, new_status: &str, previous_status: &str) {
        self.publish(RealtimeEvent::OrderStatusChanged {
            order_id: order_id.to_string(),
            status: new_status.to_string(),
            previous_status: previous_status.to_string(),
        })
        .await
    }

    async fn emit_new_recommendation(&self, recommendation: Value) {
        self.publish(RealtimeEvent::RecommendationCreated(recommendation))
            .await
    }

    async fn emit_system_maintenance(&self, notice: Value) {
        self.publish(RealtimeEvent::SystemMaintenance(notice)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<RealtimeEvent>>,
    }

    #[async_trait]
    impl RealtimePublisher for RecordingPublisher {
        async fn publish(&self, event: RealtimeEvent) {
            self.events.lock().await.push(event);
        }
    }

    #[tokio::test]
    async fn emit_helpers_build_matching_events() {
        let publisher = RecordingPublisher::default();

        publisher.emit_product_deleted("p1").await;
        publisher
            .emit_order_status_changed("o-1", "shipped", "pending")
            .await;
        publisher.emit_system_maintenance(json!({"window": "02:00"})).await;

        let events = publisher.events.lock().await;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type(), "product.deleted");
        assert_eq!(
            events[1],
            RealtimeEvent::OrderStatusChanged {
                order_id: "o-1".into(),
                status: "shipped".into(),
                previous_status: "pending".into(),
            }
        );
        assert_eq!(events[2].event_type(), "system.maintenance");
    }

    #[test]
    fn realtime_publisher_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn RealtimePublisher>();
    }
}

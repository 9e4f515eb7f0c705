//! Domain events pushed to realtime subscribers.
//!
//! Each variant knows which channels it is published on, its wire type tag,
//! and its payload shape, so adding an event kind is a compile-checked change.

use serde_json::{json, Value};

use crate::domain::inventory::{Alert, DashboardMetrics};

use super::Channel;

/// Wire type tags.
pub mod event_types {
    pub const PRODUCT_UPDATED: &str = "product.updated";
    pub const PRODUCT_DELETED: &str = "product.deleted";
    pub const STOCK_CHANGED: &str = "product.stock_changed";
    pub const METRICS_UPDATED: &str = "metrics.updated";
    pub const ALERT_CREATED: &str = "alert.created";
    pub const ALERT_UPDATED: &str = "alert.updated";
    pub const ORDER_CREATED: &str = "order.created";
    pub const ORDER_STATUS_CHANGED: &str = "order.status_changed";
    pub const RECOMMENDATION_CREATED: &str = "recommendation.created";
    pub const SYSTEM_MAINTENANCE: &str = "system.maintenance";
    pub const ALERTS_CURRENT: &str = "alerts.current";
}

/// A state change in the inventory domain worth telling clients about.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    ProductUpdated {
        product_id: String,
        data: Value,
    },
    ProductDeleted {
        product_id: String,
    },
    StockChanged {
        product_id: String,
        product_name: String,
        stock: i64,
        min_stock: i64,
    },
    DashboardUpdated(DashboardMetrics),
    AlertCreated(Alert),
    AlertUpdated {
        alert_id: String,
        patch: Value,
    },
    OrderCreated(Value),
    OrderStatusChanged {
        order_id: String,
        status: String,
        previous_status: String,
    },
    RecommendationCreated(Value),
    SystemMaintenance(Value),
}

impl RealtimeEvent {
    /// Wire type tag of this event.
    pub fn event_type(&self) -> &'static str {
        use event_types::*;
        match self {
            RealtimeEvent::ProductUpdated { .. } => PRODUCT_UPDATED,
            RealtimeEvent::ProductDeleted { .. } => PRODUCT_DELETED,
            RealtimeEvent::StockChanged { .. } => STOCK_CHANGED,
            RealtimeEvent::DashboardUpdated(_) => METRICS_UPDATED,
            RealtimeEvent::AlertCreated(_) => ALERT_CREATED,
            RealtimeEvent::AlertUpdated { .. } => ALERT_UPDATED,
            RealtimeEvent::OrderCreated(_) => ORDER_CREATED,
            RealtimeEvent::OrderStatusChanged { .. } => ORDER_STATUS_CHANGED,
            RealtimeEvent::RecommendationCreated(_) => RECOMMENDATION_CREATED,
            RealtimeEvent::SystemMaintenance(_) => SYSTEM_MAINTENANCE,
        }
    }

    /// Channels the event is published on, in publish order.
    pub fn channels(&self) -> Vec<Channel> {
        match self {
            RealtimeEvent::ProductUpdated { product_id, .. }
            | RealtimeEvent::ProductDeleted { product_id }
            | RealtimeEvent::StockChanged { product_id, .. } => {
                vec![Channel::Products, Channel::product(product_id.clone())]
            }
            RealtimeEvent::DashboardUpdated(_) => vec![Channel::Dashboard],
            RealtimeEvent::AlertCreated(_) | RealtimeEvent::AlertUpdated { .. } => {
                vec![Channel::Alerts]
            }
            RealtimeEvent::OrderCreated(_) | RealtimeEvent::OrderStatusChanged { .. } => {
                vec![Channel::Orders]
            }
            RealtimeEvent::RecommendationCreated(_) => vec![Channel::Recommendations],
            RealtimeEvent::SystemMaintenance(_) => vec![Channel::System],
        }
    }

    /// JSON payload carried in the envelope.
    pub fn payload(&self) -> Value {
        match self {
            RealtimeEvent::ProductUpdated { product_id, data } => {
                json!({ "productId": product_id, "data": data })
            }
            RealtimeEvent::ProductDeleted { product_id } => json!({ "productId": product_id }),
            RealtimeEvent::StockChanged {
                product_id,
                product_name,
                stock,
                min_stock,
            } => json!({
                "productId": product_id,
                "productName": product_name,
                "stock": stock,
                "minStock": min_stock,
                "isLowStock": stock <= min_stock,
            }),
            RealtimeEvent::DashboardUpdated(metrics) => json!(metrics),
            RealtimeEvent::AlertCreated(alert) => json!(alert),
            RealtimeEvent::AlertUpdated { alert_id, patch } => {
                json!({ "alertId": alert_id, "updates": patch })
            }
            RealtimeEvent::OrderStatusChanged {
                order_id,
                status,
                previous_status,
            } => json!({
                "orderId": order_id,
                "status": status,
                "previousStatus": previous_status,
            }),
            RealtimeEvent::OrderCreated(data)
            | RealtimeEvent::RecommendationCreated(data)
            | RealtimeEvent::SystemMaintenance(data) => data.clone(),
        }
    }

    /// The alert a stock change implies, if stock is at or below the minimum.
    ///
    /// Computed once per stock-change event, never per subscriber.
    pub fn derived_alert(&self) -> Option<RealtimeEvent> {
        match self {
            RealtimeEvent::StockChanged {
                product_id,
                product_name,
                stock,
                min_stock,
            } if stock <= min_stock => Some(RealtimeEvent::AlertCreated(Alert::low_stock(
                product_id,
                product_name,
                *stock,
                *min_stock,
            ))),
            _ => None,
        }
    }
}

//! Inventory snapshot types pushed to dashboard clients.
//!
//! These are read models: the inventory services own the real data, the
//! gateway only carries these shapes across the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::foundation::Timestamp;

/// Headline numbers shown on the inventory dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_products: u64,
    pub total_inventory_value: f64,
    pub low_stock_items: u64,
    pub out_of_stock_items: u64,
    pub pending_orders: u64,
    pub active_alerts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<Timestamp>,
}

/// Category of an inventory alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    OutOfStock,
    ExpiryWarning,
    DemandSpike,
    SystemNotice,
}

/// How urgently an alert needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    High,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// An inventory alert as shown in the alerts panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<i64>,
    #[serde(default)]
    pub acknowledged: bool,
    pub created_at: Timestamp,
}

impl Alert {
    /// Builds the alert raised when a product falls to or below its minimum.
    ///
    /// Severity is `critical` once the shelf is empty, `warning` otherwise.
    pub fn low_stock(product_id: &str, product_name: &str, stock: i64, min_stock: i64) -> Self {
        let (alert_type, severity, title) = if stock <= 0 {
            (AlertType::OutOfStock, AlertSeverity::Critical, "Out of stock")
        } else {
            (AlertType::LowStock, AlertSeverity::Warning, "Low stock")
        };

        Self {
            id: format!("alert-{}", Uuid::new_v4()),
            alert_type,
            severity,
            title: title.to_string(),
            message: format!(
                "{} has {} units left (minimum {})",
                product_name, stock, min_stock
            ),
            product_id: Some(product_id.to_string()),
            product_name: Some(product_name.to_string()),
            current_stock: Some(stock),
            min_stock: Some(min_stock),
            acknowledged: false,
            created_at: Timestamp::now(),
        }
    }

    /// Unacknowledged alerts are the ones still shown as active.
    pub fn is_active(&self) -> bool {
        !self.acknowledged
    }
}

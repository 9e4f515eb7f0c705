//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SessionValidator` - Handshake token verification
//! - `DashboardMetricsSource` / `AlertSource` - Current-state snapshots
//! - `RealtimePublisher` - What domain services call to push events

mod realtime_publisher;
mod session_validator;
mod snapshot_source;

pub use realtime_publisher::RealtimePublisher;
pub use session_validator::SessionValidator;
pub use snapshot_source::{AlertSource, DashboardMetricsSource};

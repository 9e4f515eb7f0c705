//! Snapshot source adapters.
//!
//! Implementations of the `DashboardMetricsSource` and `AlertSource` ports.
//! The inventory services own the real data; this gateway reads a cached
//! view that they keep current.

mod in_memory;

pub use in_memory::InMemoryInventorySnapshot;

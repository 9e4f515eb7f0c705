//! Domain layer containing the gateway's vocabulary and rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, auth)
//! - `inventory` - Read models pushed to clients (dashboard metrics, alerts)
//! - `realtime` - Channels, connection lifecycle, and realtime events

pub mod foundation;
pub mod inventory;
pub mod realtime;

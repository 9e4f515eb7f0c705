//! Realtime domain: channels, connection lifecycle, and the events
//! fanned out to subscribed connections.

mod channel;
mod connection;
mod event;

pub use channel::{Channel, ChannelError, MAX_CHANNEL_NAME_LEN, MAX_CHANNEL_PARAM_LEN};
pub use connection::{ConnectionInfo, ConnectionState, TerminationCause};
pub use event::{event_types, RealtimeEvent};

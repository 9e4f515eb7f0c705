//! Registry of live, authenticated connections.
//!
//! Each entry pairs the connection's identity metadata with the sending half
//! of its bounded outbound queue. The socket writer task owns the receiving
//! half, so delivery never touches the transport directly.
//!
//! ```text
//! ConnectionRegistry
//! ├── conn-a  (user-1)  ──mpsc──▶ writer task ──▶ socket
//! ├── conn-b  (user-1)  ──mpsc──▶ writer task ──▶ socket
//! └── conn-c  (user-2)  ──mpsc──▶ writer task ──▶ socket
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::{ConnectionId, UserId};
use crate::domain::realtime::ConnectionInfo;

use super::messages::Envelope;

/// Sending half of a connection's outbound queue.
pub type OutboundSender = mpsc::Sender<Arc<Envelope>>;

/// Receiving half, drained by the connection's writer task.
pub type OutboundReceiver = mpsc::Receiver<Arc<Envelope>>;

/// Creates a bounded outbound queue.
pub fn outbound_queue(capacity: usize) -> (OutboundSender, OutboundReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Why a message could not be handed to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("outbound queue is full")]
    QueueFull,

    #[error("connection is closing")]
    Closed,

    #[error("connection is not registered")]
    UnknownConnection,
}

/// A registered connection: metadata plus its outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub info: ConnectionInfo,
    sender: OutboundSender,
}

impl ConnectionHandle {
    pub fn new(info: ConnectionInfo, sender: OutboundSender) -> Self {
        Self { info, sender }
    }

    pub fn id(&self) -> ConnectionId {
        self.info.id
    }

    /// Enqueues without waiting. A slow consumer never blocks the caller.
    pub fn deliver(&self, message: Arc<Envelope>) -> Result<(), DeliveryError> {
        try_deliver(&self.sender, message)
    }
}

/// Non-blocking enqueue onto an outbound queue.
pub fn try_deliver(sender: &OutboundSender, message: Arc<Envelope>) -> Result<(), DeliveryError> {
    sender.try_send(message).map_err(|e| match e {
        mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
        mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
    })
}

/// All currently registered connections, keyed by connection id.
///
/// Lookups (every broadcast) vastly outnumber registrations, hence the
/// `RwLock`.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection. A second registration under the same id replaces
    /// the first.
    pub async fn register(&self, handle: ConnectionHandle) {
        let id = handle.id();
        let user_id = handle.info.user_id.clone();
        let replaced = self.connections.write().await.insert(id, handle);

        if replaced.is_some() {
            tracing::warn!(connection_id = %id, "Connection id registered twice; replaced");
        }
        tracing::debug!(connection_id = %id, user_id = %user_id, "Connection registered");
    }

    /// Removes a connection. Returns the removed handle, or `None` if it was
    /// not present.
    pub async fn unregister(&self, id: &ConnectionId) -> Option<ConnectionHandle> {
        self.connections.write().await.remove(id)
    }

    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Snapshot of all registered connections, oldest first.
    pub async fn list(&self) -> Vec<ConnectionInfo> {
        let mut infos: Vec<ConnectionInfo> = self
            .connections
            .read()
            .await
            .values()
            .map(|h| h.info.clone())
            .collect();
        infos.sort_by(|a, b| {
            a.connected_at
                .as_datetime()
                .cmp(b.connected_at.as_datetime())
                .then_with(|| a.id.cmp(&b.id))
        });
        infos
    }

    pub async fn get(&self, id: &ConnectionId) -> Option<ConnectionInfo> {
        self.connections.read().await.get(id).map(|h| h.info.clone())
    }

    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }

    /// Outbound queue of a single connection.
    pub async fn sender(&self, id: &ConnectionId) -> Option<OutboundSender> {
        self.connections
            .read()
            .await
            .get(id)
            .map(|h| h.sender.clone())
    }

    /// Handles for the given ids under one read lock. Unknown ids are skipped.
    pub async fn handles<'a, I>(&self, ids: I) -> Vec<ConnectionHandle>
    where
        I: IntoIterator<Item = &'a ConnectionId>,
    {
        let connections = self.connections.read().await;
        ids.into_iter()
            .filter_map(|id| connections.get(id).cloned())
            .collect()
    }

    /// Handles of every registered connection.
    pub async fn all_handles(&self) -> Vec<ConnectionHandle> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Ids of all connections opened by one user.
    pub async fn connections_for_user(&self, user_id: &UserId) -> Vec<ConnectionId> {
        self.connections
            .read()
            .await
            .values()
            .filter(|h| &h.info.user_id == user_id)
            .map(|h| h.id())
            .collect()
    }
}

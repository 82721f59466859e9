//! Stream lifetime guard

use super::{ConnectionId, ConnectionRegistry};
use inbox_core::UserId;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Owned by an open response stream; cleans up when the stream is dropped
///
/// Dropping the guard stops the connection's heartbeat task and removes the
/// connection from the registry. Both steps are safe if they already
/// happened elsewhere.
pub struct StreamGuard {
    registry: Arc<ConnectionRegistry>,
    user_id: UserId,
    connection_id: ConnectionId,
    heartbeat: JoinHandle<()>,
}

impl StreamGuard {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        user_id: UserId,
        connection_id: ConnectionId,
        heartbeat: JoinHandle<()>,
    ) -> Self {
        Self {
            registry,
            user_id,
            connection_id,
            heartbeat,
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.heartbeat.abort();
        self.registry.unregister(&self.user_id, self.connection_id);
        tracing::info!(
            user_id = %self.user_id,
            connection_id = %self.connection_id,
            "Stream closed"
        );
    }
}

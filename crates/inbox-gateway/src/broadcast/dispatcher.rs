//! Event dispatcher
//!
//! Writes events to a user's connections without blocking. A connection that
//! refuses a write is removed from the registry on the spot.

use crate::connection::{Connection, ConnectionRegistry};
use inbox_core::{EventPublisher, ServerEvent, UserId};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

/// Routes events to the open streams of their target user
pub struct EventDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl EventDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Send `event` to every connection `user_id` has open right now
    ///
    /// Returns `true` if at least one connection accepted it. A user with no
    /// open connection is not an error; the event is dropped.
    pub fn send(&self, user_id: &UserId, event: &ServerEvent) -> bool {
        let connections = self.registry.connections(user_id);
        if connections.is_empty() {
            tracing::trace!(user_id = %user_id, event = %event.kind(), "No open streams, event dropped");
            return false;
        }

        let payload: Arc<str> = match event.to_json() {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!(error = %e, event = %event.kind(), "Failed to serialize event");
                return false;
            }
        };

        let delivered = connections
            .iter()
            .filter(|connection| self.deliver(connection, payload.clone()))
            .count();

        tracing::trace!(
            user_id = %user_id,
            event = %event.kind(),
            delivered,
            attempted = connections.len(),
            "Event dispatched"
        );

        delivered > 0
    }

    /// Write one payload to one connection, unregistering it on failure
    pub fn deliver(&self, connection: &Connection, payload: Arc<str>) -> bool {
        match connection.try_send(payload) {
            Ok(()) => true,
            Err(e) => {
                let reason = match e {
                    TrySendError::Full(_) => "queue full",
                    TrySendError::Closed(_) => "stream closed",
                };
                tracing::warn!(
                    user_id = %connection.user_id(),
                    connection_id = %connection.id(),
                    reason,
                    "Write failed, dropping connection"
                );
                self.registry.unregister(connection.user_id(), connection.id());
                false
            }
        }
    }
}

impl EventPublisher for EventDispatcher {
    fn publish(&self, user_id: &UserId, event: &ServerEvent) -> bool {
        self.send(user_id, event)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("registry", &self.registry)
            .finish()
    }
}

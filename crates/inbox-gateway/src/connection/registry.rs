//! Connection registry
//!
//! Maps each user to the set of their open streams using DashMap for
//! thread-safe access. A user's bucket exists only while it is non-empty.

use super::{Connection, ConnectionId};
use dashmap::DashMap;
use inbox_core::UserId;
use std::collections::HashMap;
use std::sync::Arc;

/// All open streams, grouped by user
pub struct ConnectionRegistry {
    buckets: DashMap<UserId, HashMap<ConnectionId, Arc<Connection>>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add a connection to its user's bucket, creating the bucket if absent
    ///
    /// Registering the same connection twice has no further effect.
    pub fn register(&self, connection: Arc<Connection>) {
        let user_id = connection.user_id().clone();
        let connection_id = connection.id();

        self.buckets
            .entry(user_id.clone())
            .or_default()
            .insert(connection_id, connection);

        tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Connection registered");
    }

    /// Remove a connection, dropping the user's bucket once it is empty
    ///
    /// Returns `false` if the connection was not registered.
    pub fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        // The shard guard must be released before `remove_if` takes it again
        let removed = match self.buckets.get_mut(user_id) {
            Some(mut bucket) => bucket.remove(&connection_id),
            None => return false,
        };

        // Re-checked under the shard lock, so a concurrent register is never lost
        self.buckets.remove_if(user_id, |_, bucket| bucket.is_empty());

        if removed.is_some() {
            tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Connection unregistered");
        }
        removed.is_some()
    }

    /// Snapshot of a user's open connections
    pub fn connections(&self, user_id: &UserId) -> Vec<Arc<Connection>> {
        self.buckets
            .get(user_id)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.buckets.contains_key(user_id)
    }

    /// Total number of open connections
    pub fn connection_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len()).sum()
    }

    /// Number of users with at least one open connection
    pub fn user_count(&self) -> usize {
        self.buckets.len()
    }

    /// Drop every connection, ending all streams
    ///
    /// Returns how many connections were closed.
    pub fn close_all(&self) -> usize {
        let closed = self.connection_count();
        self.buckets.clear();
        tracing::info!(closed, "All connections closed");
        closed
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connection_count())
            .field("users", &self.user_count())
            .finish()
    }
}

//! In-memory implementation of the repository traits
//!
//! Backs `STORE=memory` deployments and the test suites. Messages keep
//! insertion order, which is also creation order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::instrument;

use inbox_core::entities::{Message, NewMessage, UserProfile};
use inbox_core::traits::{MessageRepository, RepoResult, UserRepository};
use inbox_core::value_objects::{MessageId, UserId};

#[derive(Debug, Default)]
struct Tables {
    messages: Vec<Message>,
    users: HashMap<UserId, UserProfile>,
}

/// Process-local message and profile store
///
/// Cloning is cheap; clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with profiles
    pub fn with_users(users: impl IntoIterator<Item = UserProfile>) -> Self {
        let store = Self::new();
        for user in users {
            store.upsert_user(user);
        }
        store
    }

    /// Insert or replace a profile
    pub fn upsert_user(&self, profile: UserProfile) {
        self.tables.write().users.insert(profile.id.clone(), profile);
    }

    /// Append an already-built message, keeping its id and timestamps
    pub fn insert_message(&self, message: Message) {
        self.tables.write().messages.push(message);
    }

    pub fn message_count(&self) -> usize {
        self.tables.read().messages.len()
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    #[instrument(skip(self, message), fields(sender_id = %message.sender_id, receiver_id = %message.receiver_id))]
    async fn create(&self, message: NewMessage) -> RepoResult<Message> {
        let mut tables = self.tables.write();
        // Timestamps never go backwards within the store
        let now = Utc::now();
        let created_at = tables
            .messages
            .last()
            .map_or(now, |last| last.created_at.max(now));

        let message = Message::from_new(MessageId::generate(), message, created_at);
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn find_by_participant(&self, user_id: &UserId) -> RepoResult<Vec<Message>> {
        Ok(self
            .tables
            .read()
            .messages
            .iter()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect())
    }

    async fn find_between(&self, user_id: &UserId, peer_id: &UserId) -> RepoResult<Vec<Message>> {
        Ok(self
            .tables
            .read()
            .messages
            .iter()
            .filter(|m| m.peer_of(user_id) == Some(peer_id))
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn mark_read(
        &self,
        reader_id: &UserId,
        peer_id: &UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let mut tables = self.tables.write();
        let mut updated = 0;
        for message in tables
            .messages
            .iter_mut()
            .filter(|m| &m.receiver_id == reader_id && &m.sender_id == peer_id)
        {
            if message.mark_read(at) {
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &UserId) -> RepoResult<Option<UserProfile>> {
        Ok(self.tables.read().users.get(id).cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> RepoResult<Vec<UserProfile>> {
        let tables = self.tables.read();
        Ok(ids.iter().filter_map(|id| tables.users.get(id).cloned()).collect())
    }
}

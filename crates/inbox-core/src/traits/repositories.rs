//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Message, NewMessage, UserProfile};
use crate::error::DomainError;
use crate::value_objects::UserId;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message, assigning its id and creation time
    async fn create(&self, message: NewMessage) -> RepoResult<Message>;

    /// All messages the user sent or received, oldest first
    async fn find_by_participant(&self, user_id: &UserId) -> RepoResult<Vec<Message>>;

    /// Messages exchanged between two users in either direction, oldest first
    async fn find_between(&self, user_id: &UserId, peer_id: &UserId) -> RepoResult<Vec<Message>>;

    /// Set `read_at` on every unread message from `peer_id` to `reader_id`
    ///
    /// Returns the number of messages that transitioned to read.
    async fn mark_read(
        &self,
        reader_id: &UserId,
        peer_id: &UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<u64>;
}

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a profile by id
    async fn find_by_id(&self, id: &UserId) -> RepoResult<Option<UserProfile>>;

    /// Find every known profile among `ids`; unknown ids are skipped
    async fn find_many(&self, ids: &[UserId]) -> RepoResult<Vec<UserProfile>>;
}

//! Request/response operations against the gateway

use async_trait::async_trait;
use inbox_core::{Conversation, Message, UserId};

use crate::error::ClientResult;

/// The gateway's REST surface as seen by one user
#[async_trait]
pub trait MessageApi: Send + Sync {
    /// Persist and broadcast a message; returns the confirmed copy
    async fn send_message(&self, receiver_id: &UserId, text: &str) -> ClientResult<Message>;

    /// Mark everything from `peer_id` read; returns how many changed
    async fn mark_read(&self, peer_id: &UserId) -> ClientResult<u64>;

    /// Messages exchanged with `peer_id`, oldest first
    async fn history(&self, peer_id: &UserId) -> ClientResult<Vec<Message>>;

    /// Current conversation list
    async fn conversations(&self) -> ClientResult<Vec<Conversation>>;
}

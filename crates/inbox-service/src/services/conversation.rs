//! Conversation service
//!
//! Derives a user's conversation list from the message log and pushes it to
//! their open streams.

use std::collections::HashMap;

use inbox_core::entities::{summarize_conversations, Conversation, UserProfile};
use inbox_core::events::ServerEvent;
use inbox_core::value_objects::UserId;
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Conversation aggregation
pub struct ConversationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ConversationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Current conversation list for `user_id`, newest first, without pushing
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: &UserId) -> ServiceResult<Vec<Conversation>> {
        let messages = self.ctx.message_repo().find_by_participant(user_id).await?;

        let mut peers: Vec<UserId> = messages
            .iter()
            .filter_map(|m| m.peer_of(user_id).cloned())
            .collect();
        peers.sort();
        peers.dedup();

        let profiles: HashMap<UserId, UserProfile> = self
            .ctx
            .user_repo()
            .find_many(&peers)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(summarize_conversations(user_id, &messages, &profiles))
    }

    /// Recompute the list for `user_id` and push it to their open streams
    ///
    /// Returns the list that was pushed. Having no open stream is not an error.
    #[instrument(skip(self))]
    pub async fn recompute(&self, user_id: &UserId) -> ServiceResult<Vec<Conversation>> {
        let conversations = self.list(user_id).await?;

        let delivered = self
            .ctx
            .publisher()
            .publish(user_id, &ServerEvent::conversations(conversations.clone()));
        debug!(user_id = %user_id, count = conversations.len(), delivered, "Conversations pushed");

        Ok(conversations)
    }
}

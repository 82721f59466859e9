//! Message service
//!
//! Sends direct messages, marks conversations read and serves history.
//! Every mutation is followed by pushes to the affected users' streams.

use chrono::Utc;
use inbox_core::entities::{Message, NewMessage, MAX_TEXT_LEN};
use inbox_core::error::DomainError;
use inbox_core::events::ServerEvent;
use inbox_core::value_objects::UserId;
use tracing::{info, instrument, warn};

use crate::dto::{MarkReadResponse, SendMessageRequest};

use super::context::ServiceContext;
use super::conversation::ConversationService;
use super::error::ServiceResult;

/// Message service
pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Persist a message and broadcast it
    ///
    /// Pushes a `message` event to sender and receiver, then each one's
    /// recomputed conversation list. Once the message is stored, push
    /// failures are logged and never fail the send.
    #[instrument(skip(self, request), fields(sender_id = %sender_id))]
    pub async fn send(
        &self,
        sender_id: &UserId,
        request: SendMessageRequest,
    ) -> ServiceResult<Message> {
        let receiver_id: UserId = request.receiver_id.parse().map_err(DomainError::from)?;

        let new_message = NewMessage::new(sender_id.clone(), receiver_id, request.text);
        Self::check_text(&new_message)?;

        let message = self.ctx.message_repo().create(new_message).await?;
        info!(
            message_id = %message.id,
            receiver_id = %message.receiver_id,
            "Message created"
        );

        let event = ServerEvent::message(message.clone());
        for user_id in Self::participants(&message) {
            self.ctx.publisher().publish(user_id, &event);
        }

        let conversations = ConversationService::new(self.ctx);
        for user_id in Self::participants(&message) {
            if let Err(e) = conversations.recompute(user_id).await {
                warn!(user_id = %user_id, error = %e, "Failed to push conversations");
            }
        }

        Ok(message)
    }

    /// Mark every unread message from `peer_id` to `reader_id` read
    ///
    /// Both the reader's and the peer's conversation lists are pushed, so
    /// the peer sees `read_at` on the last message.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        reader_id: &UserId,
        peer_id: &UserId,
    ) -> ServiceResult<MarkReadResponse> {
        let updated = self
            .ctx
            .message_repo()
            .mark_read(reader_id, peer_id, Utc::now())
            .await?;
        info!(reader_id = %reader_id, peer_id = %peer_id, updated, "Conversation marked read");

        let conversations = ConversationService::new(self.ctx);
        let peer = (peer_id != reader_id).then_some(peer_id);
        for user_id in std::iter::once(reader_id).chain(peer) {
            if let Err(e) = conversations.recompute(user_id).await {
                warn!(user_id = %user_id, error = %e, "Failed to push conversations");
            }
        }

        Ok(MarkReadResponse { updated })
    }

    /// Messages between `user_id` and `peer_id`, oldest first
    #[instrument(skip(self))]
    pub async fn history(&self, user_id: &UserId, peer_id: &UserId) -> ServiceResult<Vec<Message>> {
        Ok(self.ctx.message_repo().find_between(user_id, peer_id).await?)
    }

    fn check_text(message: &NewMessage) -> ServiceResult<()> {
        if message.is_blank() {
            return Err(DomainError::EmptyMessage.into());
        }
        if message.text.chars().count() > MAX_TEXT_LEN {
            return Err(DomainError::MessageTooLong { max: MAX_TEXT_LEN }.into());
        }
        Ok(())
    }

    /// Sender then receiver, once each
    fn participants(message: &Message) -> impl Iterator<Item = &UserId> {
        let receiver = (message.receiver_id != message.sender_id).then_some(&message.receiver_id);
        std::iter::once(&message.sender_id).chain(receiver)
    }
}

//! Message entity <-> model mapper

use chrono::{DateTime, Utc};
use inbox_core::entities::Message;
use inbox_core::value_objects::{MessageId, UserId};

use crate::models::MessageModel;

/// Convert MessageModel to Message entity
impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: MessageId::new(model.id),
            sender_id: UserId::new(model.sender_id),
            receiver_id: UserId::new(model.receiver_id),
            text: model.text,
            created_at: model.created_at,
            read_at: model.read_at,
        }
    }
}

/// Borrowed column values for inserting a message row
pub struct MessageInsert<'a> {
    pub id: &'a str,
    pub sender_id: &'a str,
    pub receiver_id: &'a str,
    pub text: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> MessageInsert<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self {
            id: message.id.as_str(),
            sender_id: message.sender_id.as_str(),
            receiver_id: message.receiver_id.as_str(),
            text: &message.text,
            created_at: message.created_at,
        }
    }
}

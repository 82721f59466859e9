//! Message entity - a direct message between two users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MessageId, UserId};

/// Maximum message text length in characters
pub const MAX_TEXT_LEN: usize = 4000;

/// Persisted direct message
///
/// Immutable except for `read_at`, which transitions from `None` to `Some`
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Build the persisted form of a new message
    pub fn from_new(id: MessageId, new: NewMessage, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            text: new.text,
            created_at,
            read_at: None,
        }
    }

    /// Check if the message has been read by its receiver
    #[inline]
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Whether `user` is the sender or the receiver
    #[inline]
    pub fn involves(&self, user: &UserId) -> bool {
        &self.sender_id == user || &self.receiver_id == user
    }

    /// The other party of this message from `viewer`'s point of view
    ///
    /// Returns `None` when the viewer is not a participant. A message a user
    /// sent to themselves resolves to the user.
    pub fn peer_of(&self, viewer: &UserId) -> Option<&UserId> {
        if &self.sender_id == viewer {
            Some(&self.receiver_id)
        } else if &self.receiver_id == viewer {
            Some(&self.sender_id)
        } else {
            None
        }
    }

    /// Addressed to `viewer` and not yet read
    #[inline]
    pub fn is_unread_for(&self, viewer: &UserId) -> bool {
        &self.receiver_id == viewer && self.read_at.is_none()
    }

    /// Set the read timestamp if it is not set yet
    ///
    /// Returns `true` if the message transitioned to read.
    pub fn mark_read(&mut self, at: DateTime<Utc>) -> bool {
        if self.read_at.is_some() {
            return false;
        }
        self.read_at = Some(at);
        true
    }
}

/// A message that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: String,
}

impl NewMessage {
    pub fn new(sender_id: UserId, receiver_id: UserId, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            receiver_id,
            text: text.into(),
        }
    }

    /// Check if the text is empty after trimming whitespace
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

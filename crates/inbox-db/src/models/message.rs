//! Message database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for messages table
#[derive(Debug, Clone, FromRow)]
pub struct MessageModel {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl MessageModel {
    #[inline]
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

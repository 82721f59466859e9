//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use inbox_core::entities::{Message, NewMessage};
use inbox_core::error::DomainError;
use inbox_core::traits::{MessageRepository, RepoResult};
use inbox_core::value_objects::{MessageId, UserId};

use crate::mappers::MessageInsert;
use crate::models::MessageModel;

use super::error::{map_db_error, map_unique_violation};

const SELECT_COLUMNS: &str = "SELECT id, sender_id, receiver_id, text, created_at, read_at FROM messages";

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self, message), fields(sender_id = %message.sender_id, receiver_id = %message.receiver_id))]
    async fn create(&self, message: NewMessage) -> RepoResult<Message> {
        let message = Message::from_new(MessageId::generate(), message, Utc::now());
        let row = MessageInsert::new(&message);

        sqlx::query(
            r"
            INSERT INTO messages (id, sender_id, receiver_id, text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(row.id)
        .bind(row.sender_id)
        .bind(row.receiver_id)
        .bind(row.text)
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || DomainError::DuplicateMessageId(message.id.clone()))
        })?;

        Ok(message)
    }

    #[instrument(skip(self))]
    async fn find_by_participant(&self, user_id: &UserId) -> RepoResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageModel>(&format!(
            "{SELECT_COLUMNS} WHERE sender_id = $1 OR receiver_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_between(&self, user_id: &UserId, peer_id: &UserId) -> RepoResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageModel>(&format!(
            "{SELECT_COLUMNS} \
             WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id.as_str())
        .bind(peer_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    #[instrument(skip(self))]
    async fn mark_read(
        &self,
        reader_id: &UserId,
        peer_id: &UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE messages
            SET read_at = $3
            WHERE receiver_id = $1 AND sender_id = $2 AND read_at IS NULL
            ",
        )
        .bind(reader_id.as_str())
        .bind(peer_id.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}

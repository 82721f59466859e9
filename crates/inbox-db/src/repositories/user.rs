//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use inbox_core::entities::UserProfile;
use inbox_core::traits::{RepoResult, UserRepository};
use inbox_core::value_objects::UserId;

use crate::mappers::UserInsert;
use crate::models::UserModel;

use super::error::map_db_error;

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a profile, or overwrite name and image if the id exists
    #[instrument(skip(self, profile), fields(user_id = %profile.id))]
    pub async fn upsert(&self, profile: &UserProfile) -> RepoResult<()> {
        let row = UserInsert::new(profile);

        sqlx::query(
            r"
            INSERT INTO users (id, name, image)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, image = EXCLUDED.image
            ",
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.image)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &UserId) -> RepoResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserModel>("SELECT id, name, image FROM users WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(row.map(UserProfile::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_many(&self, ids: &[UserId]) -> RepoResult<Vec<UserProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = ids.iter().map(UserId::as_str).collect();
        let rows = sqlx::query_as::<_, UserModel>(
            "SELECT id, name, image FROM users WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(UserProfile::from).collect())
    }
}

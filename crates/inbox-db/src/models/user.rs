//! User profile database model

use sqlx::FromRow;

/// Database model for users table
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

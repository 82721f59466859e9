//! # inbox-db
//!
//! Persistence adapters implementing the `inbox-core` repository traits.
//!
//! ## Overview
//!
//! - PostgreSQL via SQLx: pool management, row models, row ↔ entity mappers
//!   and the `Pg*Repository` implementations
//! - [`MemoryStore`]: a process-local store implementing both repository traits,
//!   used by `STORE=memory` and by tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inbox_db::{create_pool, apply_schema, PgMessageRepository};
//!
//! async fn example(config: &inbox_common::DatabaseConfig) -> Result<(), sqlx::Error> {
//!     let pool = create_pool(config).await?;
//!     apply_schema(&pool).await?;
//!     let messages = PgMessageRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::MemoryStore;
pub use pool::{apply_schema, create_pool, PgPool, SCHEMA};
pub use repositories::{PgMessageRepository, PgUserRepository};

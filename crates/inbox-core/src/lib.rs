//! # inbox-core
//!
//! Domain layer containing entities, identifiers, wire events, repository traits
//! and the conversation aggregation rules.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{summarize_conversations, Conversation, Message, NewMessage, UserProfile, MAX_TEXT_LEN};
pub use error::DomainError;
pub use events::{EventKind, ServerEvent};
pub use traits::{EventPublisher, MessageRepository, NoopPublisher, RepoResult, UserRepository};
pub use value_objects::{IdParseError, MessageId, UserId};

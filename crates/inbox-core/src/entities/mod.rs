//! Domain entities

mod conversation;
mod message;
mod user;

pub use conversation::{summarize_conversations, Conversation};
pub use message::{Message, NewMessage, MAX_TEXT_LEN};
pub use user::UserProfile;

//! Business logic services
//!
//! Services borrow a [`ServiceContext`] and are created per request.

pub mod context;
pub mod conversation;
pub mod error;
pub mod message;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use conversation::ConversationService;
pub use error::{ServiceError, ServiceResult};
pub use message::MessageService;

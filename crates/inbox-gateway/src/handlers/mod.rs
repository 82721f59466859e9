//! Route handlers

pub mod conversations;
pub mod health;
pub mod messages;
pub mod stream;

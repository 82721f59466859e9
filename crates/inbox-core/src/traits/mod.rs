//! Ports implemented by infrastructure crates

mod publisher;
mod repositories;

pub use publisher::{EventPublisher, NoopPublisher};
pub use repositories::{MessageRepository, RepoResult, UserRepository};

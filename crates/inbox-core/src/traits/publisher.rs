//! Outbound event port
//!
//! The service layer pushes events through this trait; the gateway's
//! broadcast dispatcher implements it.

use crate::events::ServerEvent;
use crate::value_objects::UserId;

/// Pushes events to every open stream of a user
pub trait EventPublisher: Send + Sync {
    /// Deliver `event` to all of `user_id`'s open streams without blocking.
    ///
    /// Returns `true` if at least one stream accepted it. Having no open
    /// stream is not an error; the event is dropped.
    fn publish(&self, user_id: &UserId, event: &ServerEvent) -> bool;
}

/// Publisher that drops everything, for contexts with no live streams
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _user_id: &UserId, _event: &ServerEvent) -> bool {
        false
    }
}

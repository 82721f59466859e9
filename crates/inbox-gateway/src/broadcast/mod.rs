//! Event broadcasting
//!
//! Fans serialized events out to every open stream of a user and keeps each
//! stream alive with periodic heartbeats.

mod dispatcher;
mod heartbeat;

pub use dispatcher::EventDispatcher;
pub use heartbeat::{spawn_heartbeat, DEFAULT_HEARTBEAT_INTERVAL};

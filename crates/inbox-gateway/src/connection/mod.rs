//! Connection management
//!
//! Tracks every open event stream per user and ties each stream's lifetime
//! to its registry entry.

mod connection;
mod guard;
mod registry;

pub use connection::{Connection, ConnectionId};
pub use guard::StreamGuard;
pub use registry::ConnectionRegistry;

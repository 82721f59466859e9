//! Integration test utilities
//!
//! Runs the gateway on an ephemeral port over the in-memory store and reads
//! its event streams through the client library.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;

//! Response DTOs for API endpoints

use serde::{Deserialize, Serialize};

/// Result of marking a conversation read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReadResponse {
    /// Messages that transitioned from unread to read
    pub updated: u64,
}

/// Liveness check with live stream counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Open streams across all users
    pub connections: usize,
    /// Users with at least one open stream
    pub online_users: usize,
}

impl HealthResponse {
    pub fn healthy(connections: usize, online_users: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            connections,
            online_users,
        }
    }
}

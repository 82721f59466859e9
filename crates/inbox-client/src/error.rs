//! Client error types

use thiserror::Error;

/// Errors surfaced by the client library
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or protocol failure talking to the gateway
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The event stream broke mid-read
    #[error("Stream error: {0}")]
    Stream(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// No failed send with this local key exists
    #[error("No failed message {0} to retry")]
    UnknownEntry(u64),
}

impl ClientError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The session token was rejected
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

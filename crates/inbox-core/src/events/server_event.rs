//! Server-to-client stream events
//!
//! Every event is one JSON object with a `type` tag, framed on the wire as
//! `data: <json>\n\n`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::{Conversation, Message};

/// An event delivered over a user's stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// First event on every freshly opened stream
    Connected,

    /// Keep-alive
    Heartbeat { timestamp: DateTime<Utc> },

    /// A message the user sent or received
    Message { message: Message },

    /// The user's full recomputed conversation list
    Conversations { conversations: Vec<Conversation> },
}

/// Discriminant of a [`ServerEvent`], used for logging and routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Heartbeat,
    Message,
    Conversations,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Heartbeat => "heartbeat",
            Self::Message => "message",
            Self::Conversations => "conversations",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ServerEvent {
    /// Heartbeat stamped with the current time
    pub fn heartbeat() -> Self {
        Self::Heartbeat {
            timestamp: Utc::now(),
        }
    }

    pub fn message(message: Message) -> Self {
        Self::Message { message }
    }

    pub fn conversations(conversations: Vec<Conversation>) -> Self {
        Self::Conversations { conversations }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Heartbeat { .. } => EventKind::Heartbeat,
            Self::Message { .. } => EventKind::Message,
            Self::Conversations { .. } => EventKind::Conversations,
        }
    }

    /// Serialize to the JSON payload carried in a frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a JSON payload
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Render a complete wire frame
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", self.to_json()?))
    }
}

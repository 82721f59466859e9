//! A single open event stream
//!
//! A `Connection` owns the only sender of its stream's outbound queue. Once
//! every `Arc<Connection>` is gone the queue closes and the stream ends.

use inbox_core::UserId;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Identity of one stream, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One user's open stream
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    /// Serialized event payloads waiting to be written
    sender: mpsc::Sender<Arc<str>>,
    created_at: Instant,
}

impl Connection {
    pub fn new(user_id: UserId, sender: mpsc::Sender<Arc<str>>) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::generate(),
            user_id,
            sender,
            created_at: Instant::now(),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Queue a payload without waiting
    ///
    /// Fails when the stream is gone or its queue is full.
    pub fn try_send(&self, payload: Arc<str>) -> Result<(), TrySendError<Arc<str>>> {
        self.sender.try_send(payload)
    }

    /// Whether the receiving stream has been dropped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("age", &self.age())
            .finish()
    }
}

//! Shared fixtures for service tests

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use inbox_core::{EventPublisher, Message, MessageId, ServerEvent, UserId, UserProfile};
use inbox_db::MemoryStore;
use parking_lot::Mutex;

use super::context::{ServiceContext, ServiceContextBuilder};

/// Publisher that records every event and reports it delivered
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(UserId, ServerEvent)>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<(UserId, ServerEvent)> {
        self.events.lock().clone()
    }

    pub fn events_for(&self, user: &str) -> Vec<ServerEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(to, _)| to.as_str() == user)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, user_id: &UserId, event: &ServerEvent) -> bool {
        self.events.lock().push((user_id.clone(), event.clone()));
        true
    }
}

pub fn uid(s: &str) -> UserId {
    UserId::new(s)
}

/// A message at `base + offset_secs`
pub fn message_at(
    id: &str,
    from: &str,
    to: &str,
    text: &str,
    base: DateTime<Utc>,
    offset_secs: i64,
) -> Message {
    Message {
        id: MessageId::new(id),
        sender_id: uid(from),
        receiver_id: uid(to),
        text: text.to_string(),
        created_at: base + Duration::seconds(offset_secs),
        read_at: None,
    }
}

/// Store seeded with profiles for a1, b1 and c1, plus a recording publisher
pub fn fixture() -> (ServiceContext, Arc<MemoryStore>, Arc<RecordingPublisher>) {
    let store = Arc::new(MemoryStore::with_users([
        UserProfile::new(uid("a1"), "Alice"),
        UserProfile::new(uid("b1"), "Bob"),
        UserProfile::new(uid("c1"), "Carol"),
    ]));
    let publisher = Arc::new(RecordingPublisher::default());

    let ctx = ServiceContextBuilder::new()
        .message_repo(store.clone())
        .user_repo(store.clone())
        .publisher(publisher.clone())
        .build()
        .expect("context");

    (ctx, store, publisher)
}

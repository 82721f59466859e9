//! Local message cache with duplicate suppression
//!
//! Holds one ordered list of messages per peer. The same message can arrive
//! more than once (HTTP response, stream push, history load) and an
//! optimistic local copy exists before the server has assigned an id; both
//! are folded into a single entry here.

use chrono::{DateTime, Utc};
use inbox_core::{Message, MessageId, UserId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Window within which two messages with the same text and parties are
/// taken to be the same message
pub const DUPLICATE_WINDOW: chrono::TimeDelta = chrono::TimeDelta::seconds(10);

/// Client-assigned identity of a cache entry, stable across reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalKey(u64);

impl LocalKey {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Delivery state of a cached message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Sent optimistically, not yet confirmed by the server
    Pending,
    /// Confirmed by the server
    Sent,
    /// The send request failed; kept for a manual retry
    Failed,
}

/// One cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMessage {
    pub local_key: LocalKey,
    /// Server id, absent until confirmed
    pub id: Option<MessageId>,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub status: DeliveryStatus,
}

impl CachedMessage {
    fn confirmed(local_key: LocalKey, message: &Message) -> Self {
        Self {
            local_key,
            id: Some(message.id.clone()),
            sender_id: message.sender_id.clone(),
            receiver_id: message.receiver_id.clone(),
            text: message.text.clone(),
            created_at: message.created_at,
            read_at: message.read_at,
            status: DeliveryStatus::Sent,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.id.is_some()
    }

    /// Same parties and text, created within [`DUPLICATE_WINDOW`]
    fn same_content(
        &self,
        sender_id: &UserId,
        receiver_id: &UserId,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> bool {
        self.sender_id == *sender_id
            && self.receiver_id == *receiver_id
            && self.text == text
            && (self.created_at - created_at).abs() <= DUPLICATE_WINDOW
    }

    /// Whether `incoming` is another copy of this entry
    ///
    /// Either the server ids are equal, or the parties and text match and the
    /// timestamps lie within [`DUPLICATE_WINDOW`] of each other. The second
    /// rule applies to confirmed entries too, so two identical texts sent
    /// within the window collapse into one entry.
    pub fn is_duplicate_of(&self, incoming: &Message) -> bool {
        self.id.as_ref() == Some(&incoming.id)
            || self.same_content(
                &incoming.sender_id,
                &incoming.receiver_id,
                &incoming.text,
                incoming.created_at,
            )
    }

    /// Adopt the server's identity and timestamps
    fn reconcile(&mut self, message: &Message) {
        self.id = Some(message.id.clone());
        self.created_at = message.created_at;
        self.read_at = message.read_at;
        self.status = DeliveryStatus::Sent;
    }
}

/// Result of [`MessageCache::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New entry appended
    Appended(LocalKey),
    /// Already cached under this key; no entry added
    Duplicate(LocalKey),
    /// An unconfirmed local entry took over the server identity
    Reconciled(LocalKey),
}

impl InsertOutcome {
    pub fn local_key(self) -> LocalKey {
        match self {
            Self::Appended(k) | Self::Duplicate(k) | Self::Reconciled(k) => k,
        }
    }

    /// Whether an entry was added or took over a server identity
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Duplicate(_))
    }
}

/// Per-peer message lists
#[derive(Debug, Default)]
pub struct MessageCache {
    next_key: AtomicU64,
    buckets: Mutex<HashMap<UserId, Vec<CachedMessage>>>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_key(&self) -> LocalKey {
        LocalKey(self.next_key.fetch_add(1, Ordering::Relaxed))
    }

    /// Insert a server-delivered message under `peer` unless it is a duplicate
    pub fn insert(&self, peer: &UserId, message: &Message) -> InsertOutcome {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(peer.clone()).or_default();
        self.insert_into(peer, bucket, message)
    }

    fn insert_into(&self, peer: &UserId, bucket: &mut Vec<CachedMessage>, message: &Message) -> InsertOutcome {
        // An exact id match wins over a heuristic match on an older local entry
        if let Some(existing) = bucket.iter().find(|e| e.id.as_ref() == Some(&message.id)) {
            return InsertOutcome::Duplicate(existing.local_key);
        }

        if let Some(existing) = bucket
            .iter_mut()
            .find(|e| !e.is_confirmed() && e.is_duplicate_of(message))
        {
            existing.reconcile(message);
            tracing::debug!(
                peer = %peer,
                message_id = %message.id,
                local_key = existing.local_key.0,
                "Local message confirmed"
            );
            return InsertOutcome::Reconciled(existing.local_key);
        }

        if let Some(existing) = bucket.iter().find(|e| e.is_duplicate_of(message)) {
            return InsertOutcome::Duplicate(existing.local_key);
        }

        let key = self.next_key();
        bucket.push(CachedMessage::confirmed(key, message));
        InsertOutcome::Appended(key)
    }

    /// Append an unconfirmed local copy of an outgoing message
    ///
    /// Guarded by the same content rule as [`insert`](Self::insert): a
    /// matching entry inside the window absorbs the copy and its key is
    /// returned. A matching failed entry goes back to pending.
    pub fn insert_pending(
        &self,
        sender_id: &UserId,
        receiver_id: &UserId,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> InsertOutcome {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(receiver_id.clone()).or_default();

        if let Some(existing) = bucket
            .iter_mut()
            .find(|e| e.same_content(sender_id, receiver_id, text, created_at))
        {
            if existing.status == DeliveryStatus::Failed {
                existing.status = DeliveryStatus::Pending;
                existing.created_at = created_at;
            }
            return InsertOutcome::Duplicate(existing.local_key);
        }

        let key = self.next_key();
        bucket.push(CachedMessage {
            local_key: key,
            id: None,
            sender_id: sender_id.clone(),
            receiver_id: receiver_id.clone(),
            text: text.to_string(),
            created_at,
            read_at: None,
            status: DeliveryStatus::Pending,
        });
        InsertOutcome::Appended(key)
    }

    /// Confirm local entry `key` with the server's copy of it
    ///
    /// The entry adopts the server identity whatever the clock difference,
    /// and a pushed copy appended before the confirmation is dropped. Falls
    /// back to [`insert`](Self::insert) when the entry is gone or already
    /// confirmed.
    pub fn confirm(&self, peer: &UserId, key: LocalKey, message: &Message) -> InsertOutcome {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(peer.clone()).or_default();

        let Some(index) = bucket
            .iter()
            .position(|e| e.local_key == key && !e.is_confirmed())
        else {
            return self.insert_into(peer, bucket, message);
        };
        bucket[index].reconcile(message);

        bucket.retain(|e| e.local_key == key || !e.is_duplicate_of(message));
        InsertOutcome::Reconciled(key)
    }

    /// Flag a pending entry as failed
    ///
    /// Entries already confirmed by a push are left alone.
    pub fn mark_failed(&self, peer: &UserId, key: LocalKey) -> bool {
        self.update(peer, key, |entry| {
            if entry.status == DeliveryStatus::Pending {
                entry.status = DeliveryStatus::Failed;
                true
            } else {
                false
            }
        })
    }

    /// Move a failed entry back to pending for a retry, returning its text
    pub fn take_for_retry(&self, peer: &UserId, key: LocalKey) -> Option<String> {
        let mut text = None;
        self.update(peer, key, |entry| {
            if entry.status != DeliveryStatus::Failed {
                return false;
            }
            entry.status = DeliveryStatus::Pending;
            entry.created_at = Utc::now();
            text = Some(entry.text.clone());
            true
        });
        text
    }

    /// Set `read_at` on every message from `peer` to `reader`
    pub fn mark_read_from(&self, reader: &UserId, peer: &UserId, at: DateTime<Utc>) -> usize {
        let mut buckets = self.buckets.lock();
        let Some(bucket) = buckets.get_mut(peer) else {
            return 0;
        };
        let mut updated = 0;
        for entry in bucket
            .iter_mut()
            .filter(|e| &e.sender_id == peer && &e.receiver_id == reader && e.read_at.is_none())
        {
            entry.read_at = Some(at);
            updated += 1;
        }
        updated
    }

    /// Snapshot of the messages exchanged with `peer`, in insertion order
    pub fn messages(&self, peer: &UserId) -> Vec<CachedMessage> {
        self.buckets.lock().get(peer).cloned().unwrap_or_default()
    }

    pub fn get(&self, peer: &UserId, key: LocalKey) -> Option<CachedMessage> {
        self.buckets
            .lock()
            .get(peer)
            .and_then(|bucket| bucket.iter().find(|e| e.local_key == key).cloned())
    }

    pub fn clear(&self) {
        self.buckets.lock().clear();
    }

    fn update(&self, peer: &UserId, key: LocalKey, f: impl FnOnce(&mut CachedMessage) -> bool) -> bool {
        self.buckets
            .lock()
            .get_mut(peer)
            .and_then(|bucket| bucket.iter_mut().find(|e| e.local_key == key))
            .is_some_and(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn msg(id: &str, from: &str, to: &str, text: &str, offset_secs: i64) -> Message {
        Message {
            id: MessageId::new(id),
            sender_id: UserId::new(from),
            receiver_id: UserId::new(to),
            text: text.to_string(),
            created_at: base() + TimeDelta::seconds(offset_secs),
            read_at: None,
        }
    }

    /// No two entries in the bucket satisfy the duplicate predicate
    fn assert_no_duplicates(cache: &MessageCache, peer: &UserId) {
        let entries = cache.messages(peer);
        for (i, a) in entries.iter().enumerate() {
            for b in entries.iter().skip(i + 1) {
                let same_id = a.id.is_some() && a.id == b.id;
                let same_content = a.same_content(&b.sender_id, &b.receiver_id, &b.text, b.created_at);
                assert!(!same_id && !same_content, "{a:?} duplicates {b:?}");
            }
        }
    }

    #[test]
    fn test_same_id_is_duplicate() {
        let cache = MessageCache::new();
        let peer = UserId::new("b1");
        let m = msg("m1", "a1", "b1", "hi", 0);

        let first = cache.insert(&peer, &m);
        assert!(matches!(first, InsertOutcome::Appended(_)));
        assert_eq!(cache.insert(&peer, &m), InsertOutcome::Duplicate(first.local_key()));
        assert_eq!(cache.messages(&peer).len(), 1);
    }

    #[test]
    fn test_same_text_within_window_collapses_across_ids() {
        let cache = MessageCache::new();
        let peer = UserId::new("b1");

        let first = cache.insert(&peer, &msg("m1", "a1", "b1", "ok", 0));
        let second = cache.insert(&peer, &msg("m2", "a1", "b1", "ok", 2));

        assert_eq!(second, InsertOutcome::Duplicate(first.local_key()));
        assert_eq!(cache.messages(&peer).len(), 1);
        assert_no_duplicates(&cache, &peer);
    }

    #[test]
    fn test_same_text_outside_window_is_kept() {
        let cache = MessageCache::new();
        let peer = UserId::new("b1");

        cache.insert(&peer, &msg("m1", "a1", "b1", "ok", 0));
        let later = cache.insert(&peer, &msg("m2", "a1", "b1", "ok", 11));
        cache.insert(&peer, &msg("m3", "b1", "a1", "ok", 1));

        assert!(matches!(later, InsertOutcome::Appended(_)));
        assert_eq!(cache.messages(&peer).len(), 3);
        assert_no_duplicates(&cache, &peer);
    }

    #[test]
    fn test_pending_entry_is_reconciled_by_push() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        let key = cache.insert_pending(&me, &peer, "hi", base()).local_key();
        let pending = cache.get(&peer, key).unwrap();
        assert_eq!(pending.status, DeliveryStatus::Pending);
        assert!(pending.id.is_none());

        let confirmed = msg("m1", "a1", "b1", "hi", 3);
        assert_eq!(cache.insert(&peer, &confirmed), InsertOutcome::Reconciled(key));

        let entry = cache.get(&peer, key).unwrap();
        assert_eq!(entry.id, Some(MessageId::new("m1")));
        assert_eq!(entry.created_at, confirmed.created_at);
        assert_eq!(entry.status, DeliveryStatus::Sent);

        // The HTTP response copy arriving after the push is a plain duplicate
        assert_eq!(cache.insert(&peer, &confirmed), InsertOutcome::Duplicate(key));
        assert_eq!(cache.messages(&peer).len(), 1);
    }

    #[test]
    fn test_outside_window_is_new_message() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        cache.insert_pending(&me, &peer, "hi", base());
        let outcome = cache.insert(&peer, &msg("m1", "a1", "b1", "hi", 11));

        assert!(matches!(outcome, InsertOutcome::Appended(_)));
        assert_eq!(cache.messages(&peer).len(), 2);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        let key = cache.insert_pending(&me, &peer, "hi", base()).local_key();
        assert_eq!(
            cache.insert(&peer, &msg("m1", "a1", "b1", "hi", -10)),
            InsertOutcome::Reconciled(key)
        );
    }

    #[test]
    fn test_repeated_pending_send_is_absorbed() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        let first = cache.insert_pending(&me, &peer, "ok", base());
        let again = cache.insert_pending(&me, &peer, "ok", base() + TimeDelta::seconds(1));
        assert_eq!(again, InsertOutcome::Duplicate(first.local_key()));

        let later = cache.insert_pending(&me, &peer, "ok", base() + TimeDelta::seconds(20));
        assert!(matches!(later, InsertOutcome::Appended(_)));

        assert_eq!(
            cache.insert(&peer, &msg("m1", "a1", "b1", "ok", 0)),
            InsertOutcome::Reconciled(first.local_key())
        );
        assert_eq!(
            cache.insert(&peer, &msg("m2", "a1", "b1", "ok", 20)),
            InsertOutcome::Reconciled(later.local_key())
        );
        assert_eq!(cache.messages(&peer).len(), 2);
        assert_no_duplicates(&cache, &peer);
    }

    #[test]
    fn test_resending_failed_text_revives_entry() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        let key = cache.insert_pending(&me, &peer, "hi", base()).local_key();
        cache.mark_failed(&peer, key);

        let again = cache.insert_pending(&me, &peer, "hi", base() + TimeDelta::seconds(3));
        assert_eq!(again, InsertOutcome::Duplicate(key));
        let entry = cache.get(&peer, key).unwrap();
        assert_eq!(entry.status, DeliveryStatus::Pending);
        assert_eq!(entry.created_at, base() + TimeDelta::seconds(3));
    }

    #[test]
    fn test_confirm_ignores_clock_skew() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        let key = cache.insert_pending(&me, &peer, "hi", base()).local_key();
        let server_copy = msg("m1", "a1", "b1", "hi", 30);

        assert_eq!(cache.confirm(&peer, key, &server_copy), InsertOutcome::Reconciled(key));
        let entries = cache.messages(&peer);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, Some(MessageId::new("m1")));
        assert_eq!(entries[0].created_at, server_copy.created_at);
        assert_eq!(entries[0].status, DeliveryStatus::Sent);

        assert_eq!(cache.insert(&peer, &server_copy), InsertOutcome::Duplicate(key));
    }

    #[test]
    fn test_confirm_drops_pushed_twin() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        let key = cache.insert_pending(&me, &peer, "hi", base()).local_key();
        let server_copy = msg("m1", "a1", "b1", "hi", 30);

        // The push lands first and is too far off to match the local copy
        assert!(matches!(cache.insert(&peer, &server_copy), InsertOutcome::Appended(_)));
        assert_eq!(cache.messages(&peer).len(), 2);

        assert_eq!(cache.confirm(&peer, key, &server_copy), InsertOutcome::Reconciled(key));
        let entries = cache.messages(&peer);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].local_key, key);
        assert_eq!(entries[0].status, DeliveryStatus::Sent);
    }

    #[test]
    fn test_confirm_after_push_reconciled_is_duplicate() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        let key = cache.insert_pending(&me, &peer, "hi", base()).local_key();
        let server_copy = msg("m1", "a1", "b1", "hi", 1);
        assert_eq!(cache.insert(&peer, &server_copy), InsertOutcome::Reconciled(key));

        assert_eq!(cache.confirm(&peer, key, &server_copy), InsertOutcome::Duplicate(key));
        assert_eq!(cache.messages(&peer).len(), 1);
    }

    #[test]
    fn test_failed_entry_is_retained_and_retryable() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        let key = cache.insert_pending(&me, &peer, "hi", base()).local_key();
        assert!(cache.mark_failed(&peer, key));
        assert_eq!(cache.get(&peer, key).unwrap().status, DeliveryStatus::Failed);
        assert!(!cache.mark_failed(&peer, key));

        assert_eq!(cache.take_for_retry(&peer, key).as_deref(), Some("hi"));
        assert_eq!(cache.get(&peer, key).unwrap().status, DeliveryStatus::Pending);
        assert_eq!(cache.take_for_retry(&peer, key), None);
    }

    #[test]
    fn test_confirmed_entry_is_not_marked_failed() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        let key = cache.insert_pending(&me, &peer, "hi", Utc::now()).local_key();
        let mut pushed = msg("m1", "a1", "b1", "hi", 0);
        pushed.created_at = Utc::now();
        cache.insert(&peer, &pushed);

        assert!(!cache.mark_failed(&peer, key));
        assert_eq!(cache.get(&peer, key).unwrap().status, DeliveryStatus::Sent);
    }

    #[test]
    fn test_mark_read_from_peer_only() {
        let cache = MessageCache::new();
        let me = UserId::new("a1");
        let peer = UserId::new("b1");

        cache.insert(&peer, &msg("m1", "b1", "a1", "hello", 0));
        cache.insert(&peer, &msg("m2", "a1", "b1", "hey", 1));
        cache.insert(&peer, &msg("m3", "b1", "a1", "how are you", 2));

        assert_eq!(cache.mark_read_from(&me, &peer, base()), 2);
        let unread: Vec<_> = cache
            .messages(&peer)
            .into_iter()
            .filter(|m| m.read_at.is_none())
            .map(|m| m.text)
            .collect();
        assert_eq!(unread, ["hey"]);
    }
}

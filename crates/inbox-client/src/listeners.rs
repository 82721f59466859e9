//! Keyed listener registry
//!
//! Each key holds an ordered list of callbacks. Registering returns a
//! [`Subscription`] that removes exactly that callback.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Identity of one registered callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<K, T> {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<K, Vec<(ListenerId, Callback<T>)>>>,
}

/// Callbacks grouped by key
pub struct ListenerRegistry<K, T> {
    inner: Arc<Inner<K, T>>,
}

impl<K, T> ListenerRegistry<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                listeners: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register `callback` under `key`
    pub fn subscribe<F>(&self, key: K, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .lock()
            .entry(key.clone())
            .or_default()
            .push((id, Arc::new(callback)));

        let inner: Weak<Inner<K, T>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            remove: Box::new(move || {
                inner
                    .upgrade()
                    .is_some_and(|inner| Self::remove(&inner, &key, id))
            }),
        }
    }

    /// Invoke every callback registered under `key`, in registration order
    ///
    /// Callbacks run outside the lock and may subscribe or unsubscribe.
    /// Returns the number of callbacks invoked.
    pub fn notify(&self, key: &K, value: &T) -> usize {
        let callbacks: Vec<Callback<T>> = match self.inner.listeners.lock().get(key) {
            Some(entries) => entries.iter().map(|(_, cb)| cb.clone()).collect(),
            None => return 0,
        };
        for callback in &callbacks {
            callback(value);
        }
        callbacks.len()
    }

    pub fn listener_count(&self, key: &K) -> usize {
        self.inner.listeners.lock().get(key).map_or(0, Vec::len)
    }

    fn remove(inner: &Inner<K, T>, key: &K, id: ListenerId) -> bool {
        let mut listeners = inner.listeners.lock();
        let Some(entries) = listeners.get_mut(key) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(key);
        }
        removed
    }
}

impl<K, T> Default for ListenerRegistry<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one registered callback
///
/// Dropping the handle leaves the callback registered.
#[must_use = "call unsubscribe() to remove the listener"]
pub struct Subscription {
    id: ListenerId,
    remove: Box<dyn FnOnce() -> bool + Send + Sync>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the callback; returns `false` if it was already gone
    pub fn unsubscribe(self) -> bool {
        (self.remove)()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

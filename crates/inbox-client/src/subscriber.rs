//! Event stream subscriber
//!
//! Keeps one stream open through a single supervisor task. The task opens
//! the stream, dispatches its events, and on any failure sleeps for the
//! controller's delay before trying again. The sleep lives inside the task,
//! so aborting the task also cancels a pending reconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use inbox_core::{Conversation, Message, ServerEvent, UserId};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::cache::MessageCache;
use crate::config::ReconnectPolicy;
use crate::listeners::{ListenerRegistry, Subscription};
use crate::reconnect::{ConnectionStatus, ReconnectionController};
use crate::transport::EventSource;

struct Shared {
    user_id: UserId,
    source: Arc<dyn EventSource>,
    cache: Arc<MessageCache>,
    controller: Mutex<ReconnectionController>,
    idle_timeout: Duration,
    closed: AtomicBool,
    conversations: Mutex<Vec<Conversation>>,
    message_listeners: ListenerRegistry<UserId, Message>,
    conversation_listeners: ListenerRegistry<(), Vec<Conversation>>,
    status_listeners: ListenerRegistry<(), ConnectionStatus>,
}

impl Shared {
    fn set_status(&self, update: impl FnOnce(&mut ReconnectionController) -> ConnectionStatus) {
        let status = update(&mut *self.controller.lock());
        tracing::debug!(
            user_id = %self.user_id,
            phase = %status.phase,
            attempts = status.attempts,
            degraded = status.degraded,
            "Connection status changed"
        );
        self.status_listeners.notify(&(), &status);
    }

    /// Open, read and reopen until aborted or closed
    async fn supervise(self: Arc<Self>) {
        loop {
            self.set_status(ReconnectionController::on_connecting);

            match self.source.open().await {
                Ok(mut stream) => {
                    self.set_status(ReconnectionController::on_connected);

                    loop {
                        match tokio::time::timeout(self.idle_timeout, stream.next()).await {
                            Ok(Some(Ok(payload))) => self.dispatch(&payload),
                            Ok(Some(Err(e))) => {
                                tracing::warn!(user_id = %self.user_id, error = %e, "Event stream failed");
                                break;
                            }
                            Ok(None) => {
                                tracing::info!(user_id = %self.user_id, "Event stream ended");
                                break;
                            }
                            Err(_) => {
                                tracing::warn!(
                                    user_id = %self.user_id,
                                    idle_ms = self.idle_timeout.as_millis() as u64,
                                    "Event stream idle, dropping"
                                );
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(user_id = %self.user_id, error = %e, "Failed to open event stream");
                }
            }

            if self.closed.load(Ordering::SeqCst) {
                break;
            }

            let delay = {
                let mut controller = self.controller.lock();
                controller.on_failure()
            };
            self.set_status(|controller| controller.status());
            tracing::info!(user_id = %self.user_id, delay_ms = delay.as_millis() as u64, "Reconnecting");

            tokio::time::sleep(delay).await;
        }
    }

    /// Route one raw payload; malformed payloads are dropped
    fn dispatch(&self, payload: &str) {
        let event = match ServerEvent::from_json(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "Dropping malformed event");
                return;
            }
        };

        match event {
            ServerEvent::Connected => {
                tracing::debug!(user_id = %self.user_id, "Stream acknowledged");
            }
            ServerEvent::Heartbeat { .. } => {
                tracing::trace!(user_id = %self.user_id, "Heartbeat");
            }
            ServerEvent::Message { message } => {
                let Some(peer) = message.peer_of(&self.user_id).cloned() else {
                    tracing::warn!(
                        user_id = %self.user_id,
                        message_id = %message.id,
                        "Dropping message for another user"
                    );
                    return;
                };
                self.cache.insert(&peer, &message);
                self.message_listeners.notify(&peer, &message);
            }
            ServerEvent::Conversations { conversations } => {
                *self.conversations.lock() = conversations.clone();
                self.conversation_listeners.notify(&(), &conversations);
            }
        }
    }
}

/// One user's event stream with automatic reconnection
pub struct Subscriber {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Subscriber {
    pub fn new(
        user_id: UserId,
        source: Arc<dyn EventSource>,
        cache: Arc<MessageCache>,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                user_id,
                source,
                cache,
                idle_timeout: policy.idle_timeout,
                controller: Mutex::new(ReconnectionController::new(policy)),
                closed: AtomicBool::new(false),
                conversations: Mutex::new(Vec::new()),
                message_listeners: ListenerRegistry::new(),
                conversation_listeners: ListenerRegistry::new(),
                status_listeners: ListenerRegistry::new(),
            }),
            task: Mutex::new(None),
        }
    }

    /// Open the stream, tearing down any previous one and its pending retry
    ///
    /// Must be called within a tokio runtime.
    pub fn connect(&self) {
        self.shared.closed.store(false, Ordering::SeqCst);
        let mut task = self.task.lock();
        if let Some(previous) = task.take() {
            previous.abort();
        }
        *task = Some(tokio::spawn(self.shared.clone().supervise()));
    }

    /// Stop the stream and suppress reconnection until the next `connect`
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        self.shared.set_status(ReconnectionController::on_closed);
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.controller.lock().status()
    }

    pub fn user_id(&self) -> &UserId {
        &self.shared.user_id
    }

    /// Latest conversation list pushed by the server
    pub fn conversations(&self) -> Vec<Conversation> {
        self.shared.conversations.lock().clone()
    }

    /// Replace the conversation list and notify its listeners
    pub fn replace_conversations(&self, conversations: Vec<Conversation>) {
        *self.shared.conversations.lock() = conversations.clone();
        self.shared.conversation_listeners.notify(&(), &conversations);
    }

    /// Listen for messages exchanged with `peer`
    pub fn on_message<F>(&self, peer: &UserId, callback: F) -> Subscription
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.shared.message_listeners.subscribe(peer.clone(), callback)
    }

    pub fn on_conversations<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Vec<Conversation>) + Send + Sync + 'static,
    {
        self.shared.conversation_listeners.subscribe((), callback)
    }

    pub fn on_status<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ConnectionStatus) + Send + Sync + 'static,
    {
        self.shared.status_listeners.subscribe((), callback)
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("user_id", &self.shared.user_id)
            .field("status", &self.status())
            .finish()
    }
}

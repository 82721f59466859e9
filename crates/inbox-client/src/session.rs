//! Logged-in user session
//!
//! One `ChatSession` per user: it owns the subscriber, the local cache and
//! the API client, and implements optimistic sends on top of them.

use std::sync::Arc;

use chrono::Utc;
use inbox_core::{Conversation, Message, UserId};
use tracing::{info, instrument, warn};

use crate::api::MessageApi;
use crate::cache::{CachedMessage, LocalKey, MessageCache};
use crate::config::{ClientConfig, ReconnectPolicy};
use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use crate::listeners::Subscription;
use crate::reconnect::ConnectionStatus;
use crate::subscriber::Subscriber;
use crate::transport::EventSource;

pub struct ChatSession {
    user_id: UserId,
    api: Arc<dyn MessageApi>,
    cache: Arc<MessageCache>,
    subscriber: Subscriber,
}

impl ChatSession {
    /// Session talking to the gateway over HTTP
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Arc::new(HttpClient::new(config.clone())?);
        Ok(Self::with_transport(
            config.user_id,
            config.reconnect,
            client.clone(),
            client,
        ))
    }

    /// Session over custom transport and API implementations
    pub fn with_transport(
        user_id: UserId,
        policy: ReconnectPolicy,
        source: Arc<dyn EventSource>,
        api: Arc<dyn MessageApi>,
    ) -> Self {
        let cache = Arc::new(MessageCache::new());
        let subscriber = Subscriber::new(user_id.clone(), source, cache.clone(), policy);
        Self {
            user_id,
            api,
            cache,
            subscriber,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Open the event stream; replaces any stream already open
    pub fn connect(&self) {
        info!(user_id = %self.user_id, "Connecting session");
        self.subscriber.connect();
    }

    /// Close the stream and stop reconnecting (logout)
    pub fn close(&self) {
        info!(user_id = %self.user_id, "Closing session");
        self.subscriber.close();
    }

    pub fn status(&self) -> ConnectionStatus {
        self.subscriber.status()
    }

    pub fn cache(&self) -> &MessageCache {
        &self.cache
    }

    /// Cached messages exchanged with `peer`
    pub fn messages(&self, peer: &UserId) -> Vec<CachedMessage> {
        self.cache.messages(peer)
    }

    /// Latest conversation list
    pub fn conversations(&self) -> Vec<Conversation> {
        self.subscriber.conversations()
    }

    /// Send `text` to `peer`
    ///
    /// A pending entry is visible in the cache before the request goes out.
    /// On failure that entry is kept as failed and the error returned.
    #[instrument(skip(self, text), fields(user_id = %self.user_id))]
    pub async fn send(&self, peer: &UserId, text: &str) -> ClientResult<Message> {
        let key = self
            .cache
            .insert_pending(&self.user_id, peer, text, Utc::now())
            .local_key();
        self.deliver(peer, text, key).await
    }

    /// Re-issue a failed send identified by its local key
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn retry(&self, peer: &UserId, key: LocalKey) -> ClientResult<Message> {
        let text = self
            .cache
            .take_for_retry(peer, key)
            .ok_or(ClientError::UnknownEntry(key.get()))?;
        self.deliver(peer, &text, key).await
    }

    async fn deliver(&self, peer: &UserId, text: &str, key: LocalKey) -> ClientResult<Message> {
        match self.api.send_message(peer, text).await {
            Ok(message) => {
                self.cache.confirm(peer, key, &message);
                Ok(message)
            }
            Err(e) => {
                warn!(peer = %peer, local_key = key.get(), error = %e, "Send failed");
                self.cache.mark_failed(peer, key);
                Err(e)
            }
        }
    }

    /// Load the history with `peer` into the cache and return the cached view
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn history(&self, peer: &UserId) -> ClientResult<Vec<CachedMessage>> {
        for message in self.api.history(peer).await? {
            self.cache.insert(peer, &message);
        }
        Ok(self.cache.messages(peer))
    }

    /// Mark everything from `peer` read, on the server and in the cache
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn mark_read(&self, peer: &UserId) -> ClientResult<u64> {
        let updated = self.api.mark_read(peer).await?;
        self.cache.mark_read_from(&self.user_id, peer, Utc::now());
        Ok(updated)
    }

    /// Fetch the conversation list and publish it to listeners
    pub async fn refresh_conversations(&self) -> ClientResult<Vec<Conversation>> {
        let conversations = self.api.conversations().await?;
        self.subscriber.replace_conversations(conversations.clone());
        Ok(conversations)
    }

    pub fn on_message<F>(&self, peer: &UserId, callback: F) -> Subscription
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.subscriber.on_message(peer, callback)
    }

    pub fn on_conversations<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Vec<Conversation>) + Send + Sync + 'static,
    {
        self.subscriber.on_conversations(callback)
    }

    pub fn on_status<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ConnectionStatus) + Send + Sync + 'static,
    {
        self.subscriber.on_status(callback)
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("user_id", &self.user_id)
            .field("subscriber", &self.subscriber)
            .finish()
    }
}

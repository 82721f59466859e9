//! HTTP implementation of the transport and API seams

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use inbox_core::{Conversation, Message, UserId};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::api::MessageApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::{EventSource, EventStream};

#[derive(Serialize)]
struct SendBody<'a> {
    receiver_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct MarkReadBody {
    updated: u64,
}

/// reqwest-backed gateway client
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.config.api_url(path))
            .bearer_auth(&self.config.token)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(self.config.api_url(path))
            .bearer_auth(&self.config.token)
    }

    /// Turn a non-success status into [`ClientError::Status`] carrying the body
    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl EventSource for HttpClient {
    async fn open(&self) -> ClientResult<EventStream> {
        let response = self
            .get("/stream")
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let response = Self::check(response).await?;

        let events = response.bytes_stream().eventsource().map(|item| match item {
            Ok(event) => Ok(event.data),
            Err(e) => Err(ClientError::Stream(e.to_string())),
        });
        Ok(events.boxed())
    }
}

#[async_trait]
impl MessageApi for HttpClient {
    async fn send_message(&self, receiver_id: &UserId, text: &str) -> ClientResult<Message> {
        let response = self
            .post("/messages")
            .json(&SendBody {
                receiver_id: receiver_id.as_str(),
                text,
            })
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn mark_read(&self, peer_id: &UserId) -> ClientResult<u64> {
        let response = self
            .post(&format!("/conversations/{peer_id}/read"))
            .send()
            .await?;
        let body: MarkReadBody = Self::check(response).await?.json().await?;
        Ok(body.updated)
    }

    async fn history(&self, peer_id: &UserId) -> ClientResult<Vec<Message>> {
        let response = self
            .get(&format!("/conversations/{peer_id}/messages"))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn conversations(&self) -> ClientResult<Vec<Conversation>> {
        let response = self.get("/conversations").send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("user_id", &self.config.user_id)
            .finish()
    }
}

//! Test helpers for integration tests
//!
//! Provides a running gateway, authenticated requests and an event stream
//! reader with timeouts.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use inbox_client::{ClientConfig, EventSource, EventStream, HttpClient};
use inbox_common::AppConfig;
use inbox_core::{EventKind, ServerEvent, UserId};
use inbox_db::MemoryStore;
use inbox_gateway::{assemble_state, serve, GatewayState};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::fixtures::{test_config, users};

/// How long a test waits for an expected event
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: GatewayState,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::with_users(users()));
        let state = assemble_state(config, store.clone(), store)?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            let shutdown = async move {
                shutdown_rx.await.ok();
            };
            if let Err(e) = serve(listener, server_state, shutdown).await {
                eprintln!("test server failed: {e}");
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            state,
            shutdown: Some(shutdown_tx),
            handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Session token for `user`
    pub fn token(&self, user: &str) -> String {
        self.state
            .jwt_service()
            .issue_token(&UserId::new(user))
            .unwrap_or_default()
    }

    pub fn client_config(&self, user: &str) -> ClientConfig {
        ClientConfig::new(self.base_url(), self.token(user), user)
    }

    /// Open an event stream as `user` and consume its `connected` frame
    pub async fn open_stream(&self, user: &str) -> Result<EventReader> {
        let source = HttpClient::new(self.client_config(user))?;
        let stream = source.open().await?;
        let mut reader = EventReader { stream };
        reader.expect(EventKind::Connected).await?;
        Ok(reader)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).bearer_auth(token).send().await?)
    }

    pub async fn post_auth<T: Serialize>(&self, path: &str, token: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    /// Trigger graceful shutdown and wait for the server to stop
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        tokio::time::timeout(EVENT_TIMEOUT, self.handle)
            .await
            .context("server did not stop")??;
        Ok(())
    }
}

/// Typed view over one open event stream
pub struct EventReader {
    stream: EventStream,
}

impl EventReader {
    /// Next event, failing after [`EVENT_TIMEOUT`] or when the stream ends
    pub async fn next(&mut self) -> Result<ServerEvent> {
        let payload = tokio::time::timeout(EVENT_TIMEOUT, self.stream.next())
            .await
            .context("timed out waiting for event")?
            .context("stream ended")??;
        Ok(ServerEvent::from_json(&payload)?)
    }

    /// Next event, which must be of `kind`
    pub async fn expect(&mut self, kind: EventKind) -> Result<ServerEvent> {
        let event = self.next().await?;
        anyhow::ensure!(event.kind() == kind, "expected {kind}, got {}", event.kind());
        Ok(event)
    }

    /// `true` if nothing arrives within `window`
    pub async fn is_quiet_for(&mut self, window: Duration) -> bool {
        tokio::time::timeout(window, self.stream.next()).await.is_err()
    }

    /// `true` once the server has closed the stream
    pub async fn ends(&mut self) -> bool {
        matches!(
            tokio::time::timeout(EVENT_TIMEOUT, self.stream.next()).await,
            Ok(None | Some(Err(_)))
        )
    }
}

/// Poll `condition` every 10ms until it holds or [`EVENT_TIMEOUT`] passes
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}

//! # inbox-client
//!
//! Client side of real-time direct messaging.
//!
//! ## Overview
//!
//! - [`Subscriber`]: holds one event stream open, reconnecting with backoff,
//!   and routes `message` / `conversations` events to listeners
//! - [`ReconnectionController`]: the connection phase machine and backoff schedule
//! - [`MessageCache`]: per-peer message lists with duplicate suppression and
//!   optimistic sends
//! - [`ChatSession`]: one logged-in user's session tying the above to the HTTP API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inbox_client::{ChatSession, ClientConfig};
//!
//! async fn example() -> Result<(), inbox_client::ClientError> {
//!     let session = ChatSession::new(ClientConfig::new("http://127.0.0.1:8080", token, "a1"))?;
//!     let _sub = session.on_message(&"b1".into(), |m| println!("{}", m.text));
//!     session.connect();
//!     session.send(&"b1".into(), "hi").await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod listeners;
pub mod reconnect;
pub mod session;
pub mod subscriber;
pub mod transport;

pub use api::MessageApi;
pub use cache::{CachedMessage, DeliveryStatus, InsertOutcome, LocalKey, MessageCache, DUPLICATE_WINDOW};
pub use config::{ClientConfig, ReconnectPolicy};
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use listeners::{ListenerId, ListenerRegistry, Subscription};
pub use reconnect::{ConnectionPhase, ConnectionStatus, ReconnectionController};
pub use session::ChatSession;
pub use subscriber::Subscriber;
pub use transport::{EventSource, EventStream};

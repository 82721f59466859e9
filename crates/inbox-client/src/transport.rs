//! Event stream transport seam
//!
//! The subscriber only sees a stream of raw `data` payloads, so tests can
//! drive it without a gateway.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ClientResult;

/// Raw event payloads of one open stream; ends when the stream closes
pub type EventStream = BoxStream<'static, ClientResult<String>>;

/// Opens the event stream for the session's user
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a fresh stream
    ///
    /// Fails if the stream cannot be established, including when the session
    /// token is rejected.
    async fn open(&self) -> ClientResult<EventStream>;
}

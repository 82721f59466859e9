//! Event stream handler
//!
//! Opens a long-lived server-sent event stream for the authenticated user.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::{self, Stream};
use inbox_core::ServerEvent;
use tokio::sync::mpsc;

use crate::broadcast::spawn_heartbeat;
use crate::connection::{Connection, StreamGuard};
use crate::extractors::AuthUser;
use crate::server::GatewayState;

/// Open an event stream
///
/// GET /api/v1/stream
///
/// The first frame is always `connected`. The connection is registered before
/// the response is returned and leaves the registry when the response body
/// is dropped, whichever side ends it.
pub async fn open_stream(
    State(state): State<GatewayState>,
    auth: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Arc<str>>(state.config().stream.connection_buffer);
    let connection = Connection::new(auth.user_id, tx);

    match ServerEvent::Connected.to_json() {
        Ok(json) => {
            if let Err(e) = connection.try_send(json.into()) {
                tracing::warn!(connection_id = %connection.id(), error = %e, "Failed to queue connected event");
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to serialize connected event"),
    }

    let registry = state.registry().clone();
    registry.register(connection.clone());

    let heartbeat = spawn_heartbeat(
        state.dispatcher().clone(),
        &connection,
        state.config().stream.heartbeat_interval(),
    );

    tracing::info!(
        user_id = %connection.user_id(),
        connection_id = %connection.id(),
        "Stream opened"
    );

    let guard = StreamGuard::new(
        registry,
        connection.user_id().clone(),
        connection.id(),
        heartbeat,
    );
    // The registry now holds the only strong reference; dropping it there closes the stream
    drop(connection);

    let frames = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let payload = rx.recv().await?;
        Some((Ok(Event::default().data(&*payload)), (rx, guard)))
    });

    Sse::new(frames)
}

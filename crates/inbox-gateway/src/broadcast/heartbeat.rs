//! Per-connection heartbeat task

use super::EventDispatcher;
use crate::connection::Connection;
use inbox_core::ServerEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Default cadence of `heartbeat` events
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Emit a `heartbeat` event on `connection` every `period`
///
/// The first heartbeat goes out one period after the call. The task holds
/// only a weak reference and exits once the connection is gone or a write
/// fails; a failed write unregisters the connection like any other write.
pub fn spawn_heartbeat(
    dispatcher: Arc<EventDispatcher>,
    connection: &Arc<Connection>,
    period: Duration,
) -> JoinHandle<()> {
    let connection = Arc::downgrade(connection);

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(connection) = connection.upgrade() else {
                break;
            };

            let payload = match ServerEvent::heartbeat().to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize heartbeat");
                    continue;
                }
            };

            if !dispatcher.deliver(&connection, payload.into()) {
                break;
            }
            tracing::trace!(connection_id = %connection.id(), "Heartbeat sent");
        }
    })
}

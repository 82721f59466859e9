//! Route definitions
//!
//! Stream and REST routes mounted under /api/v1, health at the root.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{conversations, health, messages, stream};
use crate::server::GatewayState;

/// Create the main router with all routes
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_v1_routes())
}

fn api_v1_routes() -> Router<GatewayState> {
    Router::new()
        .route("/stream", get(stream::open_stream))
        .route("/messages", post(messages::send_message))
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/:peer_id/read", post(conversations::mark_read))
        .route("/conversations/:peer_id/messages", get(conversations::history))
}

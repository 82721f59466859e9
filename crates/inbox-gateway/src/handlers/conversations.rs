//! Conversation handlers

use axum::{extract::State, Json};
use inbox_core::{Conversation, Message};
use inbox_service::{ConversationService, MarkReadResponse, MessageService};

use crate::extractors::{AuthUser, PeerPath};
use crate::response::ApiResult;
use crate::server::GatewayState;

/// Conversation list of the caller, most recent first
///
/// GET /api/v1/conversations
pub async fn list_conversations(
    State(state): State<GatewayState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Conversation>>> {
    let conversations = ConversationService::new(state.service_context())
        .list(&auth.user_id)
        .await?;
    Ok(Json(conversations))
}

/// Mark every unread message from the peer to the caller read
///
/// POST /api/v1/conversations/:peer_id/read
pub async fn mark_read(
    State(state): State<GatewayState>,
    auth: AuthUser,
    PeerPath(peer_id): PeerPath,
) -> ApiResult<Json<MarkReadResponse>> {
    let response = MessageService::new(state.service_context())
        .mark_read(&auth.user_id, &peer_id)
        .await?;
    Ok(Json(response))
}

/// Message history with the peer, oldest first
///
/// GET /api/v1/conversations/:peer_id/messages
pub async fn history(
    State(state): State<GatewayState>,
    auth: AuthUser,
    PeerPath(peer_id): PeerPath,
) -> ApiResult<Json<Vec<Message>>> {
    let messages = MessageService::new(state.service_context())
        .history(&auth.user_id, &peer_id)
        .await?;
    Ok(Json(messages))
}

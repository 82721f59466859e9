//! Message handlers

use axum::{extract::State, Json};
use inbox_core::Message;
use inbox_service::{MessageService, SendMessageRequest};

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::server::GatewayState;

/// Send a direct message
///
/// POST /api/v1/messages
///
/// Persists the message, then pushes it and both parties' conversation
/// lists to their open streams.
pub async fn send_message(
    State(state): State<GatewayState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<SendMessageRequest>,
) -> ApiResult<Created<Json<Message>>> {
    let service = MessageService::new(state.service_context());
    let message = service.send(&auth.user_id, request).await?;
    Ok(Created(Json(message)))
}

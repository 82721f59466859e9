//! Health check handler

use axum::{extract::State, Json};
use inbox_service::HealthResponse;

use crate::server::GatewayState;

/// Liveness check with registry counts
///
/// GET /health
pub async fn health_check(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let registry = state.registry();
    Json(HealthResponse::healthy(
        registry.connection_count(),
        registry.user_count(),
    ))
}

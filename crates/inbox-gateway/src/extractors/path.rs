//! Path parameter extractors

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use inbox_core::UserId;

use crate::response::ApiError;

/// The `:peer_id` segment of conversation routes
#[derive(Debug, Clone)]
pub struct PeerPath(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for PeerPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_path(e.to_string()))?;

        raw.parse::<UserId>()
            .map(PeerPath)
            .map_err(|e| ApiError::invalid_path(format!("peer_id: {e}")))
    }
}

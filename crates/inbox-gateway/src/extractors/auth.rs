//! Authentication extractor
//!
//! Extracts and validates the session token from the Authorization header.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use inbox_core::UserId;

use crate::response::ApiError;
use crate::server::GatewayState;

/// Authenticated user extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
}

impl AuthUser {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    GatewayState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    if e.is_missing() {
                        ApiError::MissingAuth
                    } else {
                        ApiError::InvalidAuth
                    }
                })?;

        let gateway_state = GatewayState::from_ref(state);

        let user_id = gateway_state
            .jwt_service()
            .validate_token(bearer.token())
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected session token");
                ApiError::App(e)
            })?;

        Ok(AuthUser::new(user_id))
    }
}

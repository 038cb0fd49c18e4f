use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use crate::{auth::AuthError, dao::models::UserId, error::AppError, state::SharedState};

/// Identity of the caller, taken from a valid bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidToken)?),
            None => None,
        };

        let claims = state.tokens().verify_bearer(header).inspect_err(|err| {
            debug!(error = %err, path = %parts.uri.path(), "rejected bearer token");
        })?;
        Ok(AuthUser(claims.user_id))
    }
}

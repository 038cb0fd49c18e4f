use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{
    auth::AuthError,
    dao::storage::StorageError,
    services::identity::IdentityError,
    state::{bracket::BracketError, sessions::SessionError},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unreachable or a statement failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The caller is authenticated but may not touch the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The caller has to wait before retrying.
    #[error("{0}")]
    RateLimited(String),
    /// A feature needs configuration that is missing.
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl From<BracketError> for ServiceError {
    fn from(err: BracketError) -> Self {
        match err {
            BracketError::NotEnoughParticipants(_) => ServiceError::InvalidInput(err.to_string()),
            BracketError::InvalidChoice(_) | BracketError::TournamentComplete => {
                ServiceError::InvalidState(err.to_string())
            }
        }
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            SessionError::Forbidden => ServiceError::Forbidden(err.to_string()),
            SessionError::Bracket(inner) => inner.into(),
            SessionError::NotComplete | SessionError::ReportInFlight => {
                ServiceError::InvalidState(err.to_string())
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// No credential was supplied.
    #[error("{0}")]
    Unauthorized(String),
    /// Credential rejected or resource owned by someone else.
    #[error("{0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    TooManyRequests(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error; details are logged, not returned.
    #[error("internal server error")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => AppError::Unauthorized(err.to_string()),
            AuthError::InvalidToken | AuthError::ExpiredToken => {
                AppError::Forbidden(err.to_string())
            }
            AuthError::Signing(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Storage(StorageError::Unavailable { message, .. }) => {
                AppError::ServiceUnavailable(message)
            }
            ServiceError::Storage(source @ StorageError::Backend { .. }) => {
                AppError::Internal(format!("{source}: {:?}", std::error::Error::source(&source)))
            }
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Auth(inner) => inner.into(),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::RateLimited(message) => AppError::TooManyRequests(message),
            ServiceError::NotConfigured(message) => AppError::ServiceUnavailable(message),
            ServiceError::Identity(IdentityError::Rejected(message)) => {
                AppError::Unauthorized(message)
            }
            ServiceError::Identity(inner @ IdentityError::Upstream { .. }) => {
                AppError::Internal(format!("{inner}: {:?}", std::error::Error::source(&inner)))
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(details) => {
                error!(error = %details, "request failed with an internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_401_and_403() {
        let missing: AppError = AuthError::MissingToken.into();
        let expired: AppError = ServiceError::Auth(AuthError::ExpiredToken).into();
        assert_eq!(missing.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bracket_violations_are_conflicts() {
        let err: AppError = ServiceError::from(SessionError::Bracket(
            BracketError::TournamentComplete,
        ))
        .into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_failures_split_between_503_and_500() {
        let unavailable: AppError = ServiceError::Storage(StorageError::unavailable(
            "pool timed out".into(),
            std::io::Error::other("timeout"),
        ))
        .into();
        let backend: AppError = ServiceError::Storage(StorageError::backend(
            "constraint violated".into(),
            std::io::Error::other("duplicate key"),
        ))
        .into();
        assert_eq!(
            unavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        let response = backend.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::{
        auth::{GoogleLoginRequest, LoginResponse},
        common::ErrorResponse,
    },
    error::AppError,
    services::auth_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/api/auth/google", post(google_login))
}

/// Exchange an OAuth authorization code for a session token.
#[utoipa::path(
    post,
    path = "/api/auth/google",
    tag = "auth",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Missing authorization code", body = ErrorResponse),
        (status = 401, description = "Authorization code rejected", body = ErrorResponse)
    )
)]
pub async fn google_login(
    State(state): State<SharedState>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;
    Ok(Json(auth_service::login(&state, payload).await?))
}

use axum::{Json, Router, extract::State, routing::get};

use crate::{
    auth::AuthUser, dto::ads::CooldownResponse, error::AppError, services::ads_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/api/ads/check-cooldown", get(check_cooldown))
}

/// Whether the caller may watch another rewarded ad.
#[utoipa::path(
    get,
    path = "/api/ads/check-cooldown",
    tag = "ads",
    security(("bearer" = [])),
    responses((status = 200, description = "Cooldown state", body = CooldownResponse))
)]
pub async fn check_cooldown(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CooldownResponse>, AppError> {
    Ok(Json(ads_service::check_cooldown(&state, user_id).await?))
}

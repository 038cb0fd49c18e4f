use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    auth::AuthUser,
    dto::{
        common::ErrorResponse,
        user::{
            AddPointsRequest, AddPointsResponse, PointHistoryItem, UserProfileResponse,
            UserStatsResponse,
        },
    },
    error::AppError,
    services::user_service,
    state::SharedState,
};

/// Read-only profile routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/user/me", get(me))
        .route("/api/user/my-stats", get(my_stats))
        .route("/api/user/point-history", get(point_history))
}

/// Routes that credit points.
pub fn submission_router() -> Router<SharedState> {
    Router::new().route("/api/user/add-points", post(add_points))
}

#[utoipa::path(
    get,
    path = "/api/user/me",
    tag = "user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile of the caller", body = UserProfileResponse),
        (status = 401, description = "Missing token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfileResponse>, AppError> {
    Ok(Json(user_service::me(&state, user_id).await?))
}

/// Total score and number of completed quizzes.
#[utoipa::path(
    get,
    path = "/api/user/my-stats",
    tag = "user",
    security(("bearer" = [])),
    responses((status = 200, description = "Quiz statistics of the caller", body = UserStatsResponse))
)]
pub async fn my_stats(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserStatsResponse>, AppError> {
    Ok(Json(user_service::my_stats(&state, user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/user/point-history",
    tag = "user",
    security(("bearer" = [])),
    responses((status = 200, description = "Points ledger, newest first", body = [PointHistoryItem]))
)]
pub async fn point_history(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PointHistoryItem>>, AppError> {
    Ok(Json(user_service::point_history(&state, user_id).await?))
}

/// Credit the reward of a watched ad.
#[utoipa::path(
    post,
    path = "/api/user/add-points",
    tag = "user",
    security(("bearer" = [])),
    request_body = AddPointsRequest,
    responses(
        (status = 200, description = "Points credited", body = AddPointsResponse),
        (status = 400, description = "Invalid reward", body = ErrorResponse),
        (status = 429, description = "Ad cooldown still running", body = ErrorResponse)
    )
)]
pub async fn add_points(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddPointsRequest>,
) -> Result<Json<AddPointsResponse>, AppError> {
    payload.validate()?;
    Ok(Json(user_service::add_points(&state, user_id, payload).await?))
}

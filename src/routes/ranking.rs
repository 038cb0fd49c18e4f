use axum::{Json, Router, extract::State, routing::get};

use crate::{
    auth::AuthUser,
    dto::ranking::{MyWeeklyRankResponse, WeeklyRankerResponse},
    error::AppError,
    services::ranking_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/ranking/weekly", get(weekly))
        .route("/api/ranking/my-weekly-rank", get(my_weekly_rank))
}

/// Top ten users by score since Monday 00:00 UTC.
#[utoipa::path(
    get,
    path = "/api/ranking/weekly",
    tag = "ranking",
    responses((status = 200, description = "Weekly leaderboard", body = [WeeklyRankerResponse]))
)]
pub async fn weekly(
    State(state): State<SharedState>,
) -> Result<Json<Vec<WeeklyRankerResponse>>, AppError> {
    Ok(Json(ranking_service::weekly_top(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/ranking/my-weekly-rank",
    tag = "ranking",
    security(("bearer" = [])),
    responses((status = 200, description = "Weekly rank of the caller", body = MyWeeklyRankResponse))
)]
pub async fn my_weekly_rank(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MyWeeklyRankResponse>, AppError> {
    Ok(Json(ranking_service::my_rank(&state, user_id).await?))
}

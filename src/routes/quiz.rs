use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    auth::AuthUser,
    dto::{
        common::{ErrorResponse, SuccessResponse},
        quiz::{QuizRankingEntry, QuizRankingQuery, SubmitScoreRequest},
    },
    error::AppError,
    services::quiz_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/api/quiz/ranking", get(ranking))
}

pub fn submission_router() -> Router<SharedState> {
    Router::new().route("/api/quiz/submit-score", post(submit_score))
}

#[utoipa::path(
    post,
    path = "/api/quiz/submit-score",
    tag = "quiz",
    security(("bearer" = [])),
    request_body = SubmitScoreRequest,
    responses(
        (status = 201, description = "Score stored", body = SuccessResponse),
        (status = 400, description = "Invalid submission", body = ErrorResponse)
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SubmitScoreRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), AppError> {
    payload.validate()?;
    let response = quiz_service::submit_score(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Top ten scores of a quiz.
#[utoipa::path(
    get,
    path = "/api/quiz/ranking",
    tag = "quiz",
    params(QuizRankingQuery),
    responses(
        (status = 200, description = "Best scores first", body = [QuizRankingEntry]),
        (status = 400, description = "Missing quizId", body = ErrorResponse)
    )
)]
pub async fn ranking(
    State(state): State<SharedState>,
    Query(query): Query<QuizRankingQuery>,
) -> Result<Json<Vec<QuizRankingEntry>>, AppError> {
    query.validate()?;
    let quiz_id = query
        .quiz_id
        .ok_or_else(|| AppError::BadRequest("quizId is required".into()))?;
    Ok(Json(quiz_service::ranking(&state, quiz_id).await?))
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    dto::{
        common::{ErrorResponse, SuccessResponse},
        worldcup::{
            CupResultsQuery, CupResultsResponse, CupSummary, SelectWinnerRequest, SessionView,
            StartSessionRequest, VoteRequest,
        },
    },
    error::AppError,
    services::worldcup_service,
    state::SharedState,
};

/// Catalog, results and session navigation.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/worldcup/cups", get(list_cups))
        .route("/api/worldcup/results", get(results))
        .route("/api/worldcup/sessions", post(start_session))
        .route(
            "/api/worldcup/sessions/{id}",
            get(get_session).delete(abandon_session),
        )
        .route("/api/worldcup/sessions/{id}/select", post(select_winner))
}

/// Routes that record votes.
pub fn submission_router() -> Router<SharedState> {
    Router::new()
        .route("/api/worldcup/vote", post(vote))
        .route("/api/worldcup/sessions/{id}/submit", post(submit_session))
}

#[utoipa::path(
    get,
    path = "/api/worldcup/cups",
    tag = "worldcup",
    responses((status = 200, description = "Configured world cups", body = [CupSummary]))
)]
pub async fn list_cups(State(state): State<SharedState>) -> Json<Vec<CupSummary>> {
    Json(worldcup_service::list_cups(&state))
}

/// Record the winner of a bracket played on the client.
#[utoipa::path(
    post,
    path = "/api/worldcup/vote",
    tag = "worldcup",
    security(("bearer" = [])),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = SuccessResponse),
        (status = 400, description = "Winner does not compete in the cup", body = ErrorResponse),
        (status = 404, description = "Unknown world cup", body = ErrorResponse)
    )
)]
pub async fn vote(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        worldcup_service::submit_vote(&state, user_id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/worldcup/results",
    tag = "worldcup",
    params(CupResultsQuery),
    responses(
        (status = 200, description = "Vote tallies, most voted first", body = CupResultsResponse),
        (status = 404, description = "Unknown world cup", body = ErrorResponse)
    )
)]
pub async fn results(
    State(state): State<SharedState>,
    Query(query): Query<CupResultsQuery>,
) -> Result<Json<CupResultsResponse>, AppError> {
    query.validate()?;
    let cup_id = query
        .cup_id
        .ok_or_else(|| AppError::BadRequest("cupId is required".into()))?;
    Ok(Json(worldcup_service::results(&state, cup_id).await?))
}

/// Open a server-hosted bracket.
#[utoipa::path(
    post,
    path = "/api/worldcup/sessions",
    tag = "worldcup",
    security(("bearer" = [])),
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = SessionView),
        (status = 404, description = "Unknown world cup", body = ErrorResponse)
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    payload.validate()?;
    let view = worldcup_service::start_session(&state, user_id, payload)?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/api/worldcup/sessions/{id}",
    tag = "worldcup",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Current progress", body = SessionView),
        (status = 403, description = "Session owned by another user", body = ErrorResponse),
        (status = 404, description = "Unknown or expired session", body = ErrorResponse)
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(worldcup_service::get_session(&state, user_id, id)?))
}

/// Pick the winner of the current match.
#[utoipa::path(
    post,
    path = "/api/worldcup/sessions/{id}/select",
    tag = "worldcup",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = SelectWinnerRequest,
    responses(
        (status = 200, description = "Bracket advanced", body = SessionView),
        (status = 409, description = "Name not in the current match or tournament over", body = ErrorResponse)
    )
)]
pub async fn select_winner(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectWinnerRequest>,
) -> Result<Json<SessionView>, AppError> {
    payload.validate()?;
    Ok(Json(worldcup_service::select_winner(
        &state, user_id, id, payload,
    )?))
}

/// Record the champion of a finished session as the caller's vote.
#[utoipa::path(
    post,
    path = "/api/worldcup/sessions/{id}/submit",
    tag = "worldcup",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Vote recorded; the session is closed", body = SessionView),
        (status = 409, description = "No winner yet or report already running", body = ErrorResponse)
    )
)]
pub async fn submit_session(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(
        worldcup_service::submit_session(&state, user_id, id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/worldcup/sessions/{id}",
    tag = "worldcup",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses((status = 204, description = "Session discarded"))
)]
pub async fn abandon_session(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    worldcup_service::abandon_session(&state, user_id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

//! Quiz score submission and per-quiz leaderboards.

use tracing::info;

use crate::{
    dao::models::UserId,
    dto::{
        common::SuccessResponse,
        quiz::{QuizRankingEntry, SubmitScoreRequest},
    },
    error::ServiceError,
    state::SharedState,
};

/// Entries returned by a quiz leaderboard.
pub const QUIZ_RANKING_LIMIT: i64 = 10;

pub async fn submit_score(
    state: &SharedState,
    user_id: UserId,
    request: SubmitScoreRequest,
) -> Result<SuccessResponse, ServiceError> {
    let Some((quiz_id, score)) = request.into_parts() else {
        return Err(ServiceError::InvalidInput(
            "quizId and score are required".into(),
        ));
    };
    let store = state.require_store().await?;
    store.submit_quiz_score(user_id, quiz_id.clone(), score).await?;

    info!(user_id, quiz_id = %quiz_id, score, "quiz score submitted");
    Ok(SuccessResponse::new("Score submitted successfully"))
}

/// Best scores of `quiz_id`, ties going to the earliest submission.
pub async fn ranking(
    state: &SharedState,
    quiz_id: String,
) -> Result<Vec<QuizRankingEntry>, ServiceError> {
    let store = state.require_store().await?;
    let rows = store.quiz_ranking(quiz_id, QUIZ_RANKING_LIMIT).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

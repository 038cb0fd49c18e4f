use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{dao::models::QuizRankingEntity, dto::validation::validate_identifier};

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    #[validate(required, custom(function = validate_identifier))]
    pub quiz_id: Option<String>,
    #[validate(required, range(min = 0))]
    pub score: Option<i32>,
}

impl SubmitScoreRequest {
    pub fn into_parts(self) -> Option<(String, i32)> {
        Some((self.quiz_id?, self.score?))
    }
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct QuizRankingQuery {
    /// Quiz to rank.
    #[validate(required, custom(function = validate_identifier))]
    pub quiz_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuizRankingEntry {
    pub nickname: Option<String>,
    pub picture_url: Option<String>,
    pub score: i32,
}

impl From<QuizRankingEntity> for QuizRankingEntry {
    fn from(row: QuizRankingEntity) -> Self {
        Self {
            nickname: row.nickname,
            picture_url: row.picture_url,
            score: row.score,
        }
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{PointHistoryEntity, UserEntity, UserId, UserStatsEntity},
    dto::{format_timestamp, validation::validate_not_blank},
};

/// Public profile of a user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub user_id: UserId,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub picture_url: Option<String>,
    pub points: i64,
}

impl From<UserEntity> for UserProfileResponse {
    fn from(user: UserEntity) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            nickname: user.nickname,
            picture_url: user.picture_url,
            points: user.points,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStatsResponse {
    pub total_score: i64,
    pub quizzes_completed: i64,
}

impl From<UserStatsEntity> for UserStatsResponse {
    fn from(stats: UserStatsEntity) -> Self {
        Self {
            total_score: stats.total_score,
            quizzes_completed: stats.quizzes_completed,
        }
    }
}

/// One entry of the points ledger.
#[derive(Debug, Serialize, ToSchema)]
pub struct PointHistoryItem {
    pub points_change: i64,
    pub reason: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl From<PointHistoryEntity> for PointHistoryItem {
    fn from(entry: PointHistoryEntity) -> Self {
        Self {
            points_change: entry.points_change,
            reason: entry.reason,
            created_at: format_timestamp(entry.created_at),
        }
    }
}

/// Reward claimed after watching an ad.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddPointsRequest {
    #[validate(required, range(min = 1))]
    pub points_to_add: Option<i64>,
    /// What the ad was shown for (e.g. `quiz`), recorded in the ledger reason.
    #[validate(required, length(max = 64), custom(function = validate_not_blank))]
    pub content_type: Option<String>,
}

impl AddPointsRequest {
    pub fn into_parts(self) -> Option<(i64, String)> {
        Some((self.points_to_add?, self.content_type?))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPointsResponse {
    pub success: bool,
    pub updated_points: i64,
}

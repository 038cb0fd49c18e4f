use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Primary key of a user row.
pub type UserId = i64;

/// Prefix of the point history reason written for ad rewards; cooldowns are computed from it.
pub const AD_REWARD_REASON_PREFIX: &str = "Ad watched";

/// Registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct UserEntity {
    /// Primary key.
    pub user_id: UserId,
    /// Subject identifier issued by the OAuth provider.
    pub google_id: String,
    /// E-mail reported by the provider.
    pub email: Option<String>,
    /// Display name, refreshed on every login.
    pub nickname: Option<String>,
    /// Avatar URL, refreshed on every login.
    pub picture_url: Option<String>,
    /// Current point balance.
    pub points: i64,
    /// Registration timestamp.
    pub created_at: OffsetDateTime,
}

/// Profile data received from the identity provider at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpsert {
    /// Subject identifier issued by the OAuth provider.
    pub google_id: String,
    /// E-mail reported by the provider.
    pub email: Option<String>,
    /// Display name.
    pub nickname: Option<String>,
    /// Avatar URL.
    pub picture_url: Option<String>,
}

/// Lifetime quiz aggregates of a user.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct UserStatsEntity {
    /// Sum of every submitted score.
    pub total_score: i64,
    /// Number of submitted scores.
    pub quizzes_completed: i64,
}

/// One entry of the points ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct PointHistoryEntity {
    /// Signed balance change.
    pub points_change: i64,
    /// Human readable reason (e.g. `Ad watched for quiz`).
    pub reason: String,
    /// When the change was recorded.
    pub created_at: OffsetDateTime,
}

/// One line of a per-quiz leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct QuizRankingEntity {
    pub nickname: Option<String>,
    pub picture_url: Option<String>,
    pub score: i32,
}

/// One line of the weekly leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct WeeklyRankerEntity {
    pub user_id: UserId,
    pub nickname: Option<String>,
    pub picture_url: Option<String>,
    pub weekly_score: i64,
}

/// Final pick of a user for a world cup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteEntity {
    pub user_id: UserId,
    pub cup_id: String,
    pub winner_name: String,
}

/// Accumulated tally of a world cup contestant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct CupResultEntity {
    pub participant_name: String,
    pub votes: i64,
}

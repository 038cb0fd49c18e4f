use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use crate::dao::models::{UserId, WeeklyRankerEntity};

/// Placeholder rank of a user without points this week.
const UNRANKED: &str = "N/A";

#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyRankerResponse {
    pub user_id: UserId,
    pub nickname: Option<String>,
    pub picture_url: Option<String>,
    pub weekly_score: i64,
}

impl From<WeeklyRankerEntity> for WeeklyRankerResponse {
    fn from(row: WeeklyRankerEntity) -> Self {
        Self {
            user_id: row.user_id,
            nickname: row.nickname,
            picture_url: row.picture_url,
            weekly_score: row.weekly_score,
        }
    }
}

/// 1-based position in the weekly leaderboard; serialized as a number or `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeeklyRank {
    Ranked(i64),
    Unranked,
}

impl Serialize for WeeklyRank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WeeklyRank::Ranked(rank) => serializer.serialize_i64(*rank),
            WeeklyRank::Unranked => serializer.serialize_str(UNRANKED),
        }
    }
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct MyWeeklyRankResponse {
    /// Rank as a number, or `"N/A"` when the user scored nothing this week.
    #[schema(value_type = String)]
    pub rank: WeeklyRank,
    pub weekly_score: i64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rank_serializes_as_number_or_placeholder() {
        let ranked = MyWeeklyRankResponse {
            rank: WeeklyRank::Ranked(3),
            weekly_score: 120,
        };
        let unranked = MyWeeklyRankResponse {
            rank: WeeklyRank::Unranked,
            weekly_score: 0,
        };

        assert_eq!(
            serde_json::to_value(ranked).unwrap(),
            json!({"rank": 3, "weekly_score": 120})
        );
        assert_eq!(
            serde_json::to_value(unranked).unwrap(),
            json!({"rank": "N/A", "weekly_score": 0})
        );
    }
}

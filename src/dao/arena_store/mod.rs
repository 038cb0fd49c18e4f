pub mod memory;
#[cfg(feature = "postgres-store")]
pub mod postgres;

use futures::future::BoxFuture;
use time::OffsetDateTime;

use crate::dao::models::{
    CupResultEntity, PointHistoryEntity, QuizRankingEntity, UserEntity, UserId, UserStatsEntity,
    UserUpsert, VoteEntity, WeeklyRankerEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for users, scores, points and world cup votes.
pub trait ArenaStore: Send + Sync {
    /// Create the user on first login or refresh its nickname and picture.
    fn upsert_user(&self, user: UserUpsert) -> BoxFuture<'static, StorageResult<UserEntity>>;
    fn find_user(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn user_stats(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<UserStatsEntity>>;
    /// Points ledger of a user, newest first.
    fn point_history(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'static, StorageResult<Vec<PointHistoryEntity>>>;
    /// Append a ledger entry and update the balance atomically.
    ///
    /// Returns the new balance, or `None` when the user does not exist (nothing is written).
    fn award_points(
        &self,
        user_id: UserId,
        points: i64,
        reason: String,
    ) -> BoxFuture<'static, StorageResult<Option<i64>>>;
    /// Timestamp of the latest ad reward of a user.
    fn last_ad_watched_at(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'static, StorageResult<Option<OffsetDateTime>>>;
    fn submit_quiz_score(
        &self,
        user_id: UserId,
        quiz_id: String,
        score: i32,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Best scores of a quiz, ties going to the earliest submission.
    fn quiz_ranking(
        &self,
        quiz_id: String,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizRankingEntity>>>;
    /// Users ordered by the sum of their scores submitted since `since`.
    fn weekly_top(
        &self,
        since: OffsetDateTime,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<WeeklyRankerEntity>>>;
    /// Sum of the scores a user submitted since `since` (0 when none).
    fn weekly_score(
        &self,
        user_id: UserId,
        since: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<i64>>;
    /// Number of users whose score sum since `since` is strictly greater than `score`.
    fn count_users_above(
        &self,
        score: i64,
        since: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<i64>>;
    /// Upsert the user's vote for the cup and bump the winner's tally in one transaction.
    fn record_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Tallies of a cup, most voted first.
    fn cup_results(&self, cup_id: String)
    -> BoxFuture<'static, StorageResult<Vec<CupResultEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

use std::sync::Arc;

use futures::future::BoxFuture;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    config::PostgresConfig,
    connection::establish_pool,
    error::{PostgresDaoError, PostgresResult},
    schema::SCHEMA,
};
use crate::dao::{
    arena_store::ArenaStore,
    models::{
        AD_REWARD_REASON_PREFIX, CupResultEntity, PointHistoryEntity, QuizRankingEntity,
        UserEntity, UserId, UserStatsEntity, UserUpsert, VoteEntity, WeeklyRankerEntity,
    },
    storage::StorageResult,
};

/// PostgreSQL-backed [`ArenaStore`] implementation.
#[derive(Clone)]
pub struct PostgresArenaStore {
    inner: Arc<PostgresInner>,
}

struct PostgresInner {
    pool: RwLock<PgPool>,
    config: PostgresConfig,
}

impl PostgresInner {
    async fn ping(&self) -> PostgresResult<()> {
        let pool = self.pool.read().await.clone();
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|source| PostgresDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> PostgresResult<()> {
        let pool = establish_pool(&self.config).await?;
        let previous = std::mem::replace(&mut *self.pool.write().await, pool);
        previous.close().await;
        Ok(())
    }
}

impl PostgresArenaStore {
    /// Connect to PostgreSQL and create the schema when missing.
    pub async fn connect(config: PostgresConfig) -> PostgresResult<Self> {
        let pool = establish_pool(&config).await?;
        let store = Self {
            inner: Arc::new(PostgresInner {
                pool: RwLock::new(pool),
                config,
            }),
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn pool(&self) -> PgPool {
        self.inner.pool.read().await.clone()
    }

    async fn ensure_schema(&self) -> PostgresResult<()> {
        let pool = self.pool().await;
        for &(object, statement) in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|source| PostgresDaoError::EnsureSchema { object, source })?;
        }
        Ok(())
    }

    async fn upsert_user_row(&self, user: UserUpsert) -> PostgresResult<UserEntity> {
        sqlx::query_as::<_, UserEntity>(
            "INSERT INTO users (google_id, email, nickname, picture_url)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (google_id)
             DO UPDATE SET nickname = EXCLUDED.nickname, picture_url = EXCLUDED.picture_url
             RETURNING user_id, google_id, email, nickname, picture_url, points, created_at",
        )
        .bind(user.google_id)
        .bind(user.email)
        .bind(user.nickname)
        .bind(user.picture_url)
        .fetch_one(&self.pool().await)
        .await
        .map_err(PostgresDaoError::query("upsert_user"))
    }

    async fn find_user_row(&self, user_id: UserId) -> PostgresResult<Option<UserEntity>> {
        sqlx::query_as::<_, UserEntity>(
            "SELECT user_id, google_id, email, nickname, picture_url, points, created_at
             FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool().await)
        .await
        .map_err(PostgresDaoError::query("find_user"))
    }

    async fn user_stats_row(&self, user_id: UserId) -> PostgresResult<UserStatsEntity> {
        sqlx::query_as::<_, UserStatsEntity>(
            "SELECT COALESCE(SUM(score), 0)::BIGINT AS total_score,
                    COUNT(*)::BIGINT AS quizzes_completed
             FROM quiz_scores WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool().await)
        .await
        .map_err(PostgresDaoError::query("user_stats"))
    }

    async fn point_history_rows(&self, user_id: UserId) -> PostgresResult<Vec<PointHistoryEntity>> {
        sqlx::query_as::<_, PointHistoryEntity>(
            "SELECT points_change, reason, created_at
             FROM point_history WHERE user_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool().await)
        .await
        .map_err(PostgresDaoError::query("point_history"))
    }

    async fn award_points_tx(
        &self,
        user_id: UserId,
        points: i64,
        reason: String,
    ) -> PostgresResult<Option<i64>> {
        let map_err = PostgresDaoError::query;
        let pool = self.pool().await;
        let mut tx = pool.begin().await.map_err(map_err("award_points"))?;

        let balance: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET points = points + $1 WHERE user_id = $2 RETURNING points",
        )
        .bind(points)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err("award_points"))?;

        let Some(balance) = balance else {
            tx.rollback().await.map_err(map_err("award_points"))?;
            return Ok(None);
        };

        sqlx::query("INSERT INTO point_history (user_id, points_change, reason) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(points)
            .bind(reason)
            .execute(&mut *tx)
            .await
            .map_err(map_err("award_points"))?;

        tx.commit().await.map_err(map_err("award_points"))?;
        Ok(Some(balance))
    }

    async fn last_ad_row(&self, user_id: UserId) -> PostgresResult<Option<OffsetDateTime>> {
        sqlx::query_scalar::<_, Option<OffsetDateTime>>(
            "SELECT MAX(created_at) FROM point_history WHERE user_id = $1 AND reason LIKE $2",
        )
        .bind(user_id)
        .bind(format!("{AD_REWARD_REASON_PREFIX}%"))
        .fetch_one(&self.pool().await)
        .await
        .map_err(PostgresDaoError::query("last_ad_watched_at"))
    }

    async fn insert_quiz_score(
        &self,
        user_id: UserId,
        quiz_id: String,
        score: i32,
    ) -> PostgresResult<()> {
        sqlx::query("INSERT INTO quiz_scores (user_id, quiz_id, score) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(quiz_id)
            .bind(score)
            .execute(&self.pool().await)
            .await
            .map_err(PostgresDaoError::query("submit_quiz_score"))?;
        Ok(())
    }

    async fn quiz_ranking_rows(
        &self,
        quiz_id: String,
        limit: i64,
    ) -> PostgresResult<Vec<QuizRankingEntity>> {
        sqlx::query_as::<_, QuizRankingEntity>(
            "SELECT u.nickname, u.picture_url, qs.score
             FROM quiz_scores qs
             JOIN users u ON u.user_id = qs.user_id
             WHERE qs.quiz_id = $1
             ORDER BY qs.score DESC, qs.submitted_at ASC
             LIMIT $2",
        )
        .bind(quiz_id)
        .bind(limit)
        .fetch_all(&self.pool().await)
        .await
        .map_err(PostgresDaoError::query("quiz_ranking"))
    }

    async fn weekly_top_rows(
        &self,
        since: OffsetDateTime,
        limit: i64,
    ) -> PostgresResult<Vec<WeeklyRankerEntity>> {
        sqlx::query_as::<_, WeeklyRankerEntity>(
            "SELECT u.user_id, u.nickname, u.picture_url, SUM(qs.score)::BIGINT AS weekly_score
             FROM quiz_scores qs
             JOIN users u ON u.user_id = qs.user_id
             WHERE qs.submitted_at >= $1
             GROUP BY u.user_id, u.nickname, u.picture_url
             ORDER BY weekly_score DESC, MAX(qs.submitted_at) ASC, u.user_id ASC
             LIMIT $2",
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool().await)
        .await
        .map_err(PostgresDaoError::query("weekly_top"))
    }

    async fn weekly_score_row(&self, user_id: UserId, since: OffsetDateTime) -> PostgresResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(score), 0)::BIGINT
             FROM quiz_scores WHERE user_id = $1 AND submitted_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool().await)
        .await
        .map_err(PostgresDaoError::query("weekly_score"))
    }

    async fn count_users_above_row(&self, score: i64, since: OffsetDateTime) -> PostgresResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM (
                 SELECT user_id FROM quiz_scores
                 WHERE submitted_at >= $2
                 GROUP BY user_id
                 HAVING SUM(score) > $1
             ) AS ahead",
        )
        .bind(score)
        .bind(since)
        .fetch_one(&self.pool().await)
        .await
        .map_err(PostgresDaoError::query("count_users_above"))
    }

    async fn record_vote_tx(&self, vote: VoteEntity) -> PostgresResult<()> {
        let map_err = PostgresDaoError::query;
        let pool = self.pool().await;
        let mut tx = pool.begin().await.map_err(map_err("record_vote"))?;

        sqlx::query(
            "INSERT INTO worldcup_votes (user_id, cup_id, winner_name)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, cup_id)
             DO UPDATE SET winner_name = EXCLUDED.winner_name, voted_at = NOW()",
        )
        .bind(vote.user_id)
        .bind(&vote.cup_id)
        .bind(&vote.winner_name)
        .execute(&mut *tx)
        .await
        .map_err(map_err("record_vote"))?;

        sqlx::query(
            "INSERT INTO worldcup_results (cup_id, participant_name, votes)
             VALUES ($1, $2, 1)
             ON CONFLICT (cup_id, participant_name)
             DO UPDATE SET votes = worldcup_results.votes + 1",
        )
        .bind(&vote.cup_id)
        .bind(&vote.winner_name)
        .execute(&mut *tx)
        .await
        .map_err(map_err("record_vote"))?;

        tx.commit().await.map_err(map_err("record_vote"))?;
        Ok(())
    }

    async fn cup_results_rows(&self, cup_id: String) -> PostgresResult<Vec<CupResultEntity>> {
        sqlx::query_as::<_, CupResultEntity>(
            "SELECT participant_name, votes FROM worldcup_results
             WHERE cup_id = $1
             ORDER BY votes DESC, participant_name ASC",
        )
        .bind(cup_id)
        .fetch_all(&self.pool().await)
        .await
        .map_err(PostgresDaoError::query("cup_results"))
    }
}

impl ArenaStore for PostgresArenaStore {
    fn upsert_user(&self, user: UserUpsert) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_user_row(user).await.map_err(Into::into) })
    }

    fn find_user(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user_row(user_id).await.map_err(Into::into) })
    }

    fn user_stats(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<UserStatsEntity>> {
        let store = self.clone();
        Box::pin(async move { store.user_stats_row(user_id).await.map_err(Into::into) })
    }

    fn point_history(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'static, StorageResult<Vec<PointHistoryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.point_history_rows(user_id).await.map_err(Into::into) })
    }

    fn award_points(
        &self,
        user_id: UserId,
        points: i64,
        reason: String,
    ) -> BoxFuture<'static, StorageResult<Option<i64>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .award_points_tx(user_id, points, reason)
                .await
                .map_err(Into::into)
        })
    }

    fn last_ad_watched_at(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'static, StorageResult<Option<OffsetDateTime>>> {
        let store = self.clone();
        Box::pin(async move { store.last_ad_row(user_id).await.map_err(Into::into) })
    }

    fn submit_quiz_score(
        &self,
        user_id: UserId,
        quiz_id: String,
        score: i32,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_quiz_score(user_id, quiz_id, score)
                .await
                .map_err(Into::into)
        })
    }

    fn quiz_ranking(
        &self,
        quiz_id: String,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizRankingEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .quiz_ranking_rows(quiz_id, limit)
                .await
                .map_err(Into::into)
        })
    }

    fn weekly_top(
        &self,
        since: OffsetDateTime,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<WeeklyRankerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.weekly_top_rows(since, limit).await.map_err(Into::into) })
    }

    fn weekly_score(
        &self,
        user_id: UserId,
        since: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .weekly_score_row(user_id, since)
                .await
                .map_err(Into::into)
        })
    }

    fn count_users_above(
        &self,
        score: i64,
        since: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .count_users_above_row(score, since)
                .await
                .map_err(Into::into)
        })
    }

    fn record_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.record_vote_tx(vote).await.map_err(Into::into) })
    }

    fn cup_results(
        &self,
        cup_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<CupResultEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.cup_results_rows(cup_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

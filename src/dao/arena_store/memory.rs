//! In-process [`ArenaStore`] used when no database is configured and by the test-suite.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use futures::{FutureExt, future::BoxFuture};
use time::OffsetDateTime;
use tokio::sync::Mutex;
#[cfg(test)]
use tokio::sync::OwnedMutexGuard;

use crate::dao::{
    arena_store::ArenaStore,
    models::{
        AD_REWARD_REASON_PREFIX, CupResultEntity, PointHistoryEntity, QuizRankingEntity,
        UserEntity, UserId, UserStatsEntity, UserUpsert, VoteEntity, WeeklyRankerEntity,
    },
    storage::StorageResult,
};

#[derive(Clone, Default)]
pub struct MemoryArenaStore {
    inner: Arc<Mutex<MemoryData>>,
}

#[derive(Default)]
pub(crate) struct MemoryData {
    users: BTreeMap<UserId, UserEntity>,
    next_user_id: UserId,
    point_history: Vec<(UserId, PointHistoryEntity)>,
    quiz_scores: Vec<QuizScoreRow>,
    votes: HashMap<(UserId, String), String>,
    tallies: HashMap<String, Vec<CupResultEntity>>,
}

struct QuizScoreRow {
    user_id: UserId,
    quiz_id: String,
    score: i32,
    submitted_at: OffsetDateTime,
}

impl MemoryData {
    fn weekly_totals(&self, since: OffsetDateTime) -> BTreeMap<UserId, (i64, OffsetDateTime)> {
        let mut totals: BTreeMap<UserId, (i64, OffsetDateTime)> = BTreeMap::new();
        for row in self.quiz_scores.iter().filter(|row| row.submitted_at >= since) {
            let entry = totals
                .entry(row.user_id)
                .or_insert((0, row.submitted_at));
            entry.0 += i64::from(row.score);
            entry.1 = entry.1.max(row.submitted_at);
        }
        totals
    }
}

impl MemoryArenaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryArenaStore {
    /// Insert a quiz score with an explicit submission time.
    pub(crate) async fn insert_quiz_score_at(
        &self,
        user_id: UserId,
        quiz_id: &str,
        score: i32,
        submitted_at: OffsetDateTime,
    ) {
        let mut data = self.inner.lock().await;
        data.quiz_scores.push(QuizScoreRow {
            user_id,
            quiz_id: quiz_id.to_owned(),
            score,
            submitted_at,
        });
    }

    /// Insert a ledger entry with an explicit timestamp, without touching the balance.
    pub(crate) async fn insert_point_history_at(
        &self,
        user_id: UserId,
        points_change: i64,
        reason: &str,
        created_at: OffsetDateTime,
    ) {
        let mut data = self.inner.lock().await;
        data.point_history.push((
            user_id,
            PointHistoryEntity {
                points_change,
                reason: reason.to_owned(),
                created_at,
            },
        ));
    }
}

impl ArenaStore for MemoryArenaStore {
    fn upsert_user(&self, user: UserUpsert) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let inner = self.inner.clone();
        async move {
            let mut data = inner.lock().await;
            if let Some(existing) = data
                .users
                .values_mut()
                .find(|existing| existing.google_id == user.google_id)
            {
                existing.nickname = user.nickname;
                existing.picture_url = user.picture_url;
                return Ok(existing.clone());
            }

            data.next_user_id += 1;
            let entity = UserEntity {
                user_id: data.next_user_id,
                google_id: user.google_id,
                email: user.email,
                nickname: user.nickname,
                picture_url: user.picture_url,
                points: 0,
                created_at: OffsetDateTime::now_utc(),
            };
            data.users.insert(entity.user_id, entity.clone());
            Ok(entity)
        }
        .boxed()
    }

    fn find_user(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        async move { Ok(inner.lock().await.users.get(&user_id).cloned()) }.boxed()
    }

    fn user_stats(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<UserStatsEntity>> {
        let inner = self.inner.clone();
        async move {
            let data = inner.lock().await;
            let stats = data
                .quiz_scores
                .iter()
                .filter(|row| row.user_id == user_id)
                .fold(UserStatsEntity::default(), |mut stats, row| {
                    stats.total_score += i64::from(row.score);
                    stats.quizzes_completed += 1;
                    stats
                });
            Ok(stats)
        }
        .boxed()
    }

    fn point_history(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'static, StorageResult<Vec<PointHistoryEntity>>> {
        let inner = self.inner.clone();
        async move {
            let data = inner.lock().await;
            let mut history = data
                .point_history
                .iter()
                .filter(|(owner, _)| *owner == user_id)
                .map(|(_, entry)| entry.clone())
                .collect::<Vec<_>>();
            history.reverse();
            history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(history)
        }
        .boxed()
    }

    fn award_points(
        &self,
        user_id: UserId,
        points: i64,
        reason: String,
    ) -> BoxFuture<'static, StorageResult<Option<i64>>> {
        let inner = self.inner.clone();
        async move {
            let mut data = inner.lock().await;
            let Some(user) = data.users.get_mut(&user_id) else {
                return Ok(None);
            };
            user.points += points;
            let balance = user.points;
            data.point_history.push((
                user_id,
                PointHistoryEntity {
                    points_change: points,
                    reason,
                    created_at: OffsetDateTime::now_utc(),
                },
            ));
            Ok(Some(balance))
        }
        .boxed()
    }

    fn last_ad_watched_at(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'static, StorageResult<Option<OffsetDateTime>>> {
        let inner = self.inner.clone();
        async move {
            let data = inner.lock().await;
            Ok(data
                .point_history
                .iter()
                .filter(|(owner, entry)| {
                    *owner == user_id && entry.reason.starts_with(AD_REWARD_REASON_PREFIX)
                })
                .map(|(_, entry)| entry.created_at)
                .max())
        }
        .boxed()
    }

    fn submit_quiz_score(
        &self,
        user_id: UserId,
        quiz_id: String,
        score: i32,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        async move {
            inner.lock().await.quiz_scores.push(QuizScoreRow {
                user_id,
                quiz_id,
                score,
                submitted_at: OffsetDateTime::now_utc(),
            });
            Ok(())
        }
        .boxed()
    }

    fn quiz_ranking(
        &self,
        quiz_id: String,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizRankingEntity>>> {
        let inner = self.inner.clone();
        async move {
            let data = inner.lock().await;
            let mut rows = data
                .quiz_scores
                .iter()
                .filter(|row| row.quiz_id == quiz_id)
                .filter_map(|row| data.users.get(&row.user_id).map(|user| (row, user)))
                .collect::<Vec<_>>();
            rows.sort_by(|(a, _), (b, _)| {
                b.score
                    .cmp(&a.score)
                    .then(a.submitted_at.cmp(&b.submitted_at))
            });
            Ok(rows
                .into_iter()
                .take(usize::try_from(limit).unwrap_or(0))
                .map(|(row, user)| QuizRankingEntity {
                    nickname: user.nickname.clone(),
                    picture_url: user.picture_url.clone(),
                    score: row.score,
                })
                .collect())
        }
        .boxed()
    }

    fn weekly_top(
        &self,
        since: OffsetDateTime,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<WeeklyRankerEntity>>> {
        let inner = self.inner.clone();
        async move {
            let data = inner.lock().await;
            let mut rankers = data
                .weekly_totals(since)
                .into_iter()
                .filter_map(|(user_id, (total, latest))| {
                    data.users.get(&user_id).map(|user| {
                        (
                            latest,
                            WeeklyRankerEntity {
                                user_id,
                                nickname: user.nickname.clone(),
                                picture_url: user.picture_url.clone(),
                                weekly_score: total,
                            },
                        )
                    })
                })
                .collect::<Vec<_>>();
            rankers.sort_by(|(a_latest, a), (b_latest, b)| {
                b.weekly_score
                    .cmp(&a.weekly_score)
                    .then(a_latest.cmp(b_latest))
                    .then(a.user_id.cmp(&b.user_id))
            });
            Ok(rankers
                .into_iter()
                .take(usize::try_from(limit).unwrap_or(0))
                .map(|(_, ranker)| ranker)
                .collect())
        }
        .boxed()
    }

    fn weekly_score(
        &self,
        user_id: UserId,
        since: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<i64>> {
        let inner = self.inner.clone();
        async move {
            let data = inner.lock().await;
            Ok(data
                .weekly_totals(since)
                .get(&user_id)
                .map(|(total, _)| *total)
                .unwrap_or(0))
        }
        .boxed()
    }

    fn count_users_above(
        &self,
        score: i64,
        since: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<i64>> {
        let inner = self.inner.clone();
        async move {
            let data = inner.lock().await;
            let above = data
                .weekly_totals(since)
                .values()
                .filter(|(total, _)| *total > score)
                .count();
            Ok(i64::try_from(above).unwrap_or(i64::MAX))
        }
        .boxed()
    }

    fn record_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        async move {
            let mut data = inner.lock().await;
            data.votes.insert(
                (vote.user_id, vote.cup_id.clone()),
                vote.winner_name.clone(),
            );

            let tallies = data.tallies.entry(vote.cup_id).or_default();
            match tallies
                .iter_mut()
                .find(|tally| tally.participant_name == vote.winner_name)
            {
                Some(tally) => tally.votes += 1,
                None => tallies.push(CupResultEntity {
                    participant_name: vote.winner_name,
                    votes: 1,
                }),
            }
            Ok(())
        }
        .boxed()
    }

    fn cup_results(
        &self,
        cup_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<CupResultEntity>>> {
        let inner = self.inner.clone();
        async move {
            let data = inner.lock().await;
            let mut results = data.tallies.get(&cup_id).cloned().unwrap_or_default();
            results.sort_by(|a, b| {
                b.votes
                    .cmp(&a.votes)
                    .then(a.participant_name.cmp(&b.participant_name))
            });
            Ok(results)
        }
        .boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        async { Ok(()) }.boxed()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        async { Ok(()) }.boxed()
    }
}

#[cfg(test)]
impl MemoryArenaStore {
    /// Winner currently recorded for a user and cup.
    pub(crate) async fn vote_of(&self, user_id: UserId, cup_id: &str) -> Option<String> {
        self.inner
            .lock()
            .await
            .votes
            .get(&(user_id, cup_id.to_owned()))
            .cloned()
    }

    /// Hold the store lock so every operation blocks until the guard is dropped.
    pub(crate) async fn pause(&self) -> OwnedMutexGuard<MemoryData> {
        self.inner.clone().lock_owned().await
    }
}

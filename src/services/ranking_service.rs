//! Weekly leaderboard over quiz scores.

use time::{OffsetDateTime, Time};

use crate::{
    dao::models::UserId,
    dto::ranking::{MyWeeklyRankResponse, WeeklyRank, WeeklyRankerResponse},
    error::ServiceError,
    state::SharedState,
};

/// Entries returned by the weekly leaderboard.
pub const WEEKLY_RANKING_LIMIT: i64 = 10;

/// Monday 00:00 UTC of the week containing `now`.
pub fn week_start(now: OffsetDateTime) -> OffsetDateTime {
    let now = now.to_offset(time::UtcOffset::UTC);
    let days_since_monday = now.weekday().number_days_from_monday();
    (now - time::Duration::days(i64::from(days_since_monday))).replace_time(Time::MIDNIGHT)
}

pub async fn weekly_top(state: &SharedState) -> Result<Vec<WeeklyRankerResponse>, ServiceError> {
    let store = state.require_store().await?;
    let since = week_start(OffsetDateTime::now_utc());
    let rows = store.weekly_top(since, WEEKLY_RANKING_LIMIT).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Rank of the caller this week; users without points are unranked.
pub async fn my_rank(
    state: &SharedState,
    user_id: UserId,
) -> Result<MyWeeklyRankResponse, ServiceError> {
    let store = state.require_store().await?;
    let since = week_start(OffsetDateTime::now_utc());

    let weekly_score = store.weekly_score(user_id, since).await?;
    if weekly_score == 0 {
        return Ok(MyWeeklyRankResponse {
            rank: WeeklyRank::Unranked,
            weekly_score,
        });
    }

    let above = store.count_users_above(weekly_score, since).await?;
    Ok(MyWeeklyRankResponse {
        rank: WeeklyRank::Ranked(above + 1),
        weekly_score,
    })
}

#[cfg(test)]
mod tests {
    use time::{Duration, Weekday, macros::datetime};

    use super::*;
    use crate::test_support::{sign_in, test_state};

    #[test]
    fn week_starts_on_monday_midnight() {
        assert_eq!(
            week_start(datetime!(2024-05-16 17:45 UTC)),
            datetime!(2024-05-13 0:00 UTC)
        );
        assert_eq!(
            week_start(datetime!(2024-05-13 0:00 UTC)),
            datetime!(2024-05-13 0:00 UTC)
        );
        assert_eq!(
            week_start(datetime!(2024-05-19 23:59:59 UTC)),
            datetime!(2024-05-13 0:00 UTC)
        );
        assert_eq!(
            week_start(datetime!(2024-05-13 1:00 +02:00)),
            datetime!(2024-05-06 0:00 UTC)
        );
        assert_eq!(week_start(OffsetDateTime::now_utc()).weekday(), Weekday::Monday);
    }

    #[tokio::test]
    async fn ranking_counts_only_this_week() {
        let (state, store) = test_state().await;
        let (rm, _) = sign_in(&state, &store, "rm").await;
        let (jimin, _) = sign_in(&state, &store, "jimin").await;
        let (v, _) = sign_in(&state, &store, "v").await;

        let now = OffsetDateTime::now_utc();
        let last_week = week_start(now) - Duration::hours(1);
        store.insert_quiz_score_at(rm, "q1", 50, now).await;
        store.insert_quiz_score_at(rm, "q2", 30, now).await;
        store.insert_quiz_score_at(jimin, "q1", 100, now).await;
        store.insert_quiz_score_at(v, "q1", 500, last_week).await;

        let top = weekly_top(&state).await.unwrap();
        let board: Vec<_> = top
            .iter()
            .map(|entry| (entry.user_id, entry.weekly_score))
            .collect();
        assert_eq!(board, vec![(jimin, 100), (rm, 80)]);

        assert_eq!(
            my_rank(&state, rm).await.unwrap(),
            MyWeeklyRankResponse {
                rank: WeeklyRank::Ranked(2),
                weekly_score: 80
            }
        );
        assert_eq!(
            my_rank(&state, v).await.unwrap(),
            MyWeeklyRankResponse {
                rank: WeeklyRank::Unranked,
                weekly_score: 0
            }
        );
    }

    #[tokio::test]
    async fn tied_users_share_a_rank() {
        let (state, store) = test_state().await;
        let (a, _) = sign_in(&state, &store, "a").await;
        let (b, _) = sign_in(&state, &store, "b").await;
        let now = OffsetDateTime::now_utc();
        store.insert_quiz_score_at(a, "q", 40, now).await;
        store.insert_quiz_score_at(b, "q", 40, now).await;

        assert_eq!(my_rank(&state, a).await.unwrap().rank, WeeklyRank::Ranked(1));
        assert_eq!(my_rank(&state, b).await.unwrap().rank, WeeklyRank::Ranked(1));
    }
}

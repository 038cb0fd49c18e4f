//! Rewarded-ad cooldown arithmetic.

use time::{Duration, OffsetDateTime};

use crate::{
    dao::models::UserId, dto::ads::CooldownResponse, error::ServiceError, state::SharedState,
};

const MILLIS_PER_MINUTE: i128 = 60_000;

/// Whole minutes (rounded up) before another ad may be watched.
///
/// Returns 0 without a previous ad or once the window elapsed. A timestamp in the future is
/// treated as "just watched".
pub fn remaining_cooldown(
    last_watched: Option<OffsetDateTime>,
    now: OffsetDateTime,
    window_minutes: i64,
) -> i64 {
    let Some(last_watched) = last_watched else {
        return 0;
    };

    let window = Duration::minutes(window_minutes);
    let elapsed = (now - last_watched).max(Duration::ZERO);
    if elapsed >= window {
        return 0;
    }

    let remaining_ms = (window - elapsed).whole_milliseconds();
    let minutes = (remaining_ms + MILLIS_PER_MINUTE - 1) / MILLIS_PER_MINUTE;
    i64::try_from(minutes).unwrap_or(window_minutes)
}

/// Cooldown state of `user_id` right now.
pub async fn check_cooldown(
    state: &SharedState,
    user_id: UserId,
) -> Result<CooldownResponse, ServiceError> {
    let minutes = cooldown_minutes_left(state, user_id).await?;
    Ok(CooldownResponse::from_remaining(minutes))
}

pub(crate) async fn cooldown_minutes_left(
    state: &SharedState,
    user_id: UserId,
) -> Result<i64, ServiceError> {
    let store = state.require_store().await?;
    let last_watched = store.last_ad_watched_at(user_id).await?;
    Ok(remaining_cooldown(
        last_watched,
        OffsetDateTime::now_utc(),
        state.config().ads.cooldown_minutes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sign_in, test_state};

    #[test]
    fn cooldown_arithmetic() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(remaining_cooldown(None, now, 15), 0);
        assert_eq!(remaining_cooldown(Some(now - Duration::minutes(20)), now, 15), 0);
        assert_eq!(remaining_cooldown(Some(now - Duration::minutes(15)), now, 15), 0);
        assert_eq!(remaining_cooldown(Some(now - Duration::minutes(5)), now, 15), 10);
        assert_eq!(remaining_cooldown(Some(now - Duration::seconds(30)), now, 15), 15);
        assert_eq!(
            remaining_cooldown(Some(now - Duration::seconds(14 * 60 + 1)), now, 15),
            1
        );
    }

    #[test]
    fn future_timestamp_is_clamped_to_window() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(remaining_cooldown(Some(now + Duration::hours(3)), now, 15), 15);
    }

    #[tokio::test]
    async fn only_ad_rewards_start_a_cooldown() {
        let (state, store) = test_state().await;
        let (user_id, _) = sign_in(&state, &store, "army").await;

        store
            .insert_point_history_at(user_id, 50, "Quiz bonus", OffsetDateTime::now_utc())
            .await;
        assert_eq!(
            check_cooldown(&state, user_id).await.unwrap(),
            CooldownResponse {
                can_watch_ad: true,
                time_remaining: 0
            }
        );

        store
            .insert_point_history_at(
                user_id,
                10,
                "Ad watched for quiz",
                OffsetDateTime::now_utc() - Duration::minutes(5),
            )
            .await;
        let cooldown = check_cooldown(&state, user_id).await.unwrap();
        assert!(!cooldown.can_watch_ad);
        assert!((10..=11).contains(&cooldown.time_remaining));
    }
}

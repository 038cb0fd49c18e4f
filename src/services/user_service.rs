//! Profile, statistics and points of the signed-in user.

use tracing::info;

use crate::{
    dao::models::{AD_REWARD_REASON_PREFIX, UserId},
    dto::user::{
        AddPointsRequest, AddPointsResponse, PointHistoryItem, UserProfileResponse,
        UserStatsResponse,
    },
    error::ServiceError,
    services::ads_service,
    state::SharedState,
};

pub async fn me(state: &SharedState, user_id: UserId) -> Result<UserProfileResponse, ServiceError> {
    let store = state.require_store().await?;
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("user not found".into()))?;
    Ok(user.into())
}

pub async fn my_stats(
    state: &SharedState,
    user_id: UserId,
) -> Result<UserStatsResponse, ServiceError> {
    let store = state.require_store().await?;
    Ok(store.user_stats(user_id).await?.into())
}

/// Points ledger of the user, newest first.
pub async fn point_history(
    state: &SharedState,
    user_id: UserId,
) -> Result<Vec<PointHistoryItem>, ServiceError> {
    let store = state.require_store().await?;
    let history = store.point_history(user_id).await?;
    Ok(history.into_iter().map(Into::into).collect())
}

/// Credit an ad reward unless the user is still in cooldown.
pub async fn add_points(
    state: &SharedState,
    user_id: UserId,
    request: AddPointsRequest,
) -> Result<AddPointsResponse, ServiceError> {
    let Some((points, content_type)) = request.into_parts() else {
        return Err(ServiceError::InvalidInput(
            "pointsToAdd and contentType are required".into(),
        ));
    };
    let max = state.config().ads.max_reward_points;
    if points > max {
        return Err(ServiceError::InvalidInput(format!(
            "an ad reward cannot exceed {max} points"
        )));
    }

    let minutes = ads_service::cooldown_minutes_left(state, user_id).await?;
    if minutes > 0 {
        return Err(ServiceError::RateLimited(format!(
            "please wait {minutes} more minute(s) before watching another ad"
        )));
    }

    let store = state.require_store().await?;
    let reason = format!("{AD_REWARD_REASON_PREFIX} for {}", content_type.trim());
    let updated_points = store
        .award_points(user_id, points, reason)
        .await?
        .ok_or_else(|| ServiceError::NotFound("user not found".into()))?;

    info!(user_id, points, updated_points, "ad reward credited");
    Ok(AddPointsResponse {
        success: true,
        updated_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sign_in, test_state};

    fn reward(points: i64) -> AddPointsRequest {
        AddPointsRequest {
            points_to_add: Some(points),
            content_type: Some("quiz".into()),
        }
    }

    #[tokio::test]
    async fn ad_reward_is_credited_once_per_window() {
        let (state, store) = test_state().await;
        let (user_id, _) = sign_in(&state, &store, "once").await;

        let response = add_points(&state, user_id, reward(10)).await.unwrap();
        assert_eq!(response.updated_points, 10);

        let err = add_points(&state, user_id, reward(10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::RateLimited(_)));

        let profile = me(&state, user_id).await.unwrap();
        assert_eq!(profile.points, 10);
        let history = point_history(&state, user_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reason, "Ad watched for quiz");
    }

    #[tokio::test]
    async fn oversized_reward_is_rejected() {
        let (state, store) = test_state().await;
        let (user_id, _) = sign_in(&state, &store, "blink").await;

        let err = add_points(&state, user_id, reward(1_000)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (state, _store) = test_state().await;
        assert!(matches!(
            me(&state, 404).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            add_points(&state, 404, reward(5)).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn degraded_mode_is_reported() {
        let (state, _store) = test_state().await;
        state.clear_store().await;
        assert!(matches!(
            my_stats(&state, 1).await,
            Err(ServiceError::Degraded)
        ));
    }
}

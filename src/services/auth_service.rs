//! Login through the OAuth authorization-code exchange.

use tracing::info;

use crate::{
    dao::models::UserUpsert,
    dto::auth::{GoogleLoginRequest, LoginResponse},
    error::ServiceError,
    state::SharedState,
};

/// Exchange the authorization code, upsert the user and issue a session token.
pub async fn login(
    state: &SharedState,
    request: GoogleLoginRequest,
) -> Result<LoginResponse, ServiceError> {
    let Some(code) = request.code else {
        return Err(ServiceError::InvalidInput(
            "authorization code is required".into(),
        ));
    };
    let identity = state
        .identity()
        .ok_or_else(|| ServiceError::NotConfigured("OAuth login is not configured".into()))?;
    let store = state.require_store().await?;

    let external = identity.exchange(code).await?;
    let user = store
        .upsert_user(UserUpsert {
            google_id: external.subject,
            email: external.email,
            nickname: external.name,
            picture_url: external.picture,
        })
        .await?;
    let token = state.tokens().issue(user.user_id)?;

    info!(user_id = user.user_id, "user signed in");
    Ok(LoginResponse {
        token,
        user: user.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::identity::IdentityError,
        state::AppState,
        test_support::{test_config, test_state},
    };

    fn code(value: &str) -> GoogleLoginRequest {
        GoogleLoginRequest {
            code: Some(value.into()),
        }
    }

    #[tokio::test]
    async fn login_creates_then_refreshes_user() {
        let (state, _store) = test_state().await;

        let first = login(&state, code("abc")).await.unwrap();
        let second = login(&state, code("abc")).await.unwrap();

        assert_eq!(first.user.user_id, second.user.user_id);
        assert_eq!(first.user.points, 0);
        assert_eq!(first.user.nickname.as_deref(), Some("fan abc"));
        let claims = state.tokens().verify(&second.token).unwrap();
        assert_eq!(claims.user_id, first.user.user_id);
    }

    #[tokio::test]
    async fn rejected_code_is_reported() {
        let (state, _store) = test_state().await;
        assert!(matches!(
            login(&state, code("bad-code")).await,
            Err(ServiceError::Identity(IdentityError::Rejected(_)))
        ));
    }

    #[tokio::test]
    async fn login_without_provider_is_not_configured() {
        let state = AppState::new(test_config(), None);
        assert!(matches!(
            login(&state, code("abc")).await,
            Err(ServiceError::NotConfigured(_))
        ));
    }
}

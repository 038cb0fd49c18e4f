//! Exchange of an OAuth authorization code for the identity of the signed-in user.

use std::error::Error;

use futures::future::BoxFuture;
use thiserror::Error;

/// Profile reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Stable subject identifier.
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider refused the authorization code.
    #[error("authorization code rejected: {0}")]
    Rejected(String),
    /// The provider could not be reached or answered garbage.
    #[error("identity provider failure: {message}")]
    Upstream {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Source of external identities, swapped for a stub in tests.
pub trait IdentityProvider: Send + Sync {
    fn exchange(&self, code: String) -> BoxFuture<'static, Result<ExternalIdentity, IdentityError>>;
}

#[cfg(feature = "oauth-login")]
pub use self::oauth::OAuthIdentityProvider;

#[cfg(feature = "oauth-login")]
mod oauth {
    use futures::future::BoxFuture;
    use reqwest::{Client, StatusCode};
    use serde::Deserialize;
    use tracing::debug;

    use super::{ExternalIdentity, IdentityError, IdentityProvider};
    use crate::config::OAuthConfig;

    /// Authorization-code exchange against a standard OAuth2 token endpoint and userinfo endpoint.
    #[derive(Clone)]
    pub struct OAuthIdentityProvider {
        client: Client,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        token_url: String,
        userinfo_url: String,
    }

    #[derive(Deserialize)]
    struct TokenResponse {
        access_token: String,
    }

    #[derive(Deserialize)]
    struct UserInfo {
        sub: String,
        email: Option<String>,
        name: Option<String>,
        picture: Option<String>,
    }

    impl OAuthIdentityProvider {
        /// Build the provider, or `None` when the client credentials are missing.
        pub fn from_config(config: &OAuthConfig) -> Option<Self> {
            Some(Self {
                client: Client::new(),
                client_id: config.client_id.clone()?,
                client_secret: config.client_secret.clone()?,
                redirect_uri: config
                    .redirect_uri
                    .clone()
                    .unwrap_or_else(|| "postmessage".to_owned()),
                token_url: config.token_url.clone(),
                userinfo_url: config.userinfo_url.clone(),
            })
        }

        async fn exchange_code(&self, code: String) -> Result<ExternalIdentity, IdentityError> {
            let response = self
                .client
                .post(&self.token_url)
                .form(&[
                    ("grant_type", "authorization_code"),
                    ("code", code.as_str()),
                    ("client_id", self.client_id.as_str()),
                    ("client_secret", self.client_secret.as_str()),
                    ("redirect_uri", self.redirect_uri.as_str()),
                ])
                .send()
                .await
                .map_err(upstream("token request failed"))?;

            match response.status() {
                status if status.is_success() => {}
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                    let body = response.text().await.unwrap_or_default();
                    debug!(body = %body, "token endpoint rejected authorization code");
                    return Err(IdentityError::Rejected(
                        "the provider did not accept the authorization code".into(),
                    ));
                }
                status => {
                    return Err(IdentityError::Upstream {
                        message: format!("token endpoint answered {status}"),
                        source: format!("unexpected status {status}").into(),
                    });
                }
            }

            let token: TokenResponse = response
                .json()
                .await
                .map_err(upstream("token response could not be decoded"))?;

            let info: UserInfo = self
                .client
                .get(&self.userinfo_url)
                .bearer_auth(&token.access_token)
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(upstream("userinfo request failed"))?
                .json()
                .await
                .map_err(upstream("userinfo response could not be decoded"))?;

            Ok(ExternalIdentity {
                subject: info.sub,
                email: info.email,
                name: info.name,
                picture: info.picture,
            })
        }
    }

    fn upstream(message: &'static str) -> impl FnOnce(reqwest::Error) -> IdentityError {
        move |source| IdentityError::Upstream {
            message: message.to_owned(),
            source: Box::new(source),
        }
    }

    impl IdentityProvider for OAuthIdentityProvider {
        fn exchange(
            &self,
            code: String,
        ) -> BoxFuture<'static, Result<ExternalIdentity, IdentityError>> {
            let provider = self.clone();
            Box::pin(async move { provider.exchange_code(code).await })
        }
    }
}

/// Provider answering every code with a fixed identity.
#[cfg(test)]
pub(crate) mod stub {
    use futures::future::BoxFuture;

    use super::{ExternalIdentity, IdentityError, IdentityProvider};

    pub(crate) struct StubIdentityProvider;

    impl IdentityProvider for StubIdentityProvider {
        fn exchange(
            &self,
            code: String,
        ) -> BoxFuture<'static, Result<ExternalIdentity, IdentityError>> {
            Box::pin(async move {
                if code == "bad-code" {
                    return Err(IdentityError::Rejected("unknown code".into()));
                }
                Ok(ExternalIdentity {
                    subject: format!("subject-{code}"),
                    email: Some(format!("{code}@example.com")),
                    name: Some(format!("fan {code}")),
                    picture: Some(format!("https://example.com/{code}.png")),
                })
            })
        }
    }
}

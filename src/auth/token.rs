use std::time::Duration;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::dao::models::UserId;

/// Payload of the tokens issued at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub iat: i64,
    pub exp: i64,
}

/// Reasons a request could not be authenticated.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no authentication token provided")]
    MissingToken,
    #[error("invalid authentication token")]
    InvalidToken,
    #[error("authentication token has expired")]
    ExpiredToken,
    /// Encoding a new token failed.
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Issues and validates HS256 tokens signed with the server secret.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenVerifier {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user_id` valid from now.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    /// Sign a token for `user_id` as if issued at `issued_at`.
    pub fn issue_at(&self, user_id: UserId, issued_at: OffsetDateTime) -> Result<String, AuthError> {
        let iat = issued_at.unix_timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id,
            iat,
            exp: iat.saturating_add(ttl),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }

    /// Verify the value of an `Authorization: Bearer <token>` header.
    pub fn verify_bearer(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let token = header
            .and_then(|value| value.split_once(' '))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new("test-secret", Duration::from_secs(24 * 3600))
    }

    #[test]
    fn issued_token_round_trips_user_id() {
        let tokens = verifier();
        let token = tokens.issue(42).unwrap();
        let claims = tokens.verify_bearer(Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn missing_or_empty_header_is_missing_token() {
        let tokens = verifier();
        assert!(matches!(tokens.verify_bearer(None), Err(AuthError::MissingToken)));
        assert!(matches!(tokens.verify_bearer(Some("Bearer")), Err(AuthError::MissingToken)));
        assert!(matches!(tokens.verify_bearer(Some("Bearer  ")), Err(AuthError::MissingToken)));
    }

    #[test]
    fn garbage_and_foreign_tokens_are_invalid() {
        let tokens = verifier();
        assert!(matches!(
            tokens.verify_bearer(Some("Bearer not-a-jwt")),
            Err(AuthError::InvalidToken)
        ));

        let foreign = TokenVerifier::new("other-secret", Duration::from_secs(60))
            .issue(1)
            .unwrap();
        assert!(matches!(tokens.verify(&foreign), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let tokens = verifier();
        let token = tokens
            .issue_at(7, OffsetDateTime::now_utc() - time::Duration::days(2))
            .unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::ExpiredToken)));
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::{user::UserProfileResponse, validation::validate_not_blank};

/// Authorization code obtained by the client from the OAuth consent screen.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GoogleLoginRequest {
    #[validate(required, custom(function = validate_not_blank))]
    pub code: Option<String>,
}

/// Session token and profile of the signed-in user.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfileResponse,
}

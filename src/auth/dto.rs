use serde::{Deserialize, Serialize};

use crate::users::dto::UserResponse;

/// Form body for login. The `username` field carries the email, matching the
/// OAuth2 password-flow convention the API has always used.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Response for login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

impl TokenResponse {
    pub fn bearer(access_token: String, user: UserResponse) -> Self {
        Self {
            access_token,
            token_type: "bearer".into(),
            user,
        }
    }
}

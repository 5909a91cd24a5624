use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app::internal_error;
use crate::config::JwtConfig;
use crate::state::AppState;
use crate::users::repo::User;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

/// JWT signing and verification keys plus token policy.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub algorithm: Algorithm,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            ttl_minutes,
            algorithm,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl: Duration::minutes(ttl_minutes),
        }
    }
}

impl JwtKeys {
    /// Signs a token with the configured TTL.
    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_ttl(user_id, self.ttl)
    }

    pub fn sign_with_ttl(&self, user_id: Uuid, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: (now + ttl).unix_timestamp() as usize,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// `None` for malformed, mis-signed or expired tokens; never errors.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let validation = Validation::new(self.algorithm);
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "jwt rejected");
                None
            }
        }
    }
}

fn unauthorized() -> (StatusCode, String) {
    (
        StatusCode::UNAUTHORIZED,
        "Could not validate credentials".to_string(),
    )
}

/// Resolves the bearer token to a full user row. Any failure along the way
/// (missing/malformed header, bad token, unknown user) is a 401.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(unauthorized)?;

        let claims = keys.verify(token).ok_or_else(|| {
            warn!("invalid or expired token");
            unauthorized()
        })?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(internal_error)?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token subject no longer exists");
                unauthorized()
            })?;

        Ok(CurrentUser(user))
    }
}

/// [`CurrentUser`] that additionally requires the admin flag.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err((
                StatusCode::FORBIDDEN,
                "The user doesn't have enough privileges".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
    }

    #[tokio::test]
    async fn verify_rejects_expired_token() {
        let keys = make_keys();
        // Well past the default 60s leeway.
        let token = keys
            .sign_with_ttl(Uuid::new_v4(), Duration::seconds(-120))
            .expect("sign");
        assert!(keys.verify(&token).is_none());
    }

    #[tokio::test]
    async fn verify_honors_ttl_override() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys
            .sign_with_ttl(user_id, Duration::hours(48))
            .expect("sign");
        assert_eq!(keys.verify(&token).expect("verify").sub, user_id);
    }

    #[tokio::test]
    async fn verify_rejects_garbage_and_tampering() {
        let keys = make_keys();
        assert!(keys.verify("not.a.jwt").is_none());
        assert!(keys.verify("").is_none());

        let token = keys.sign(Uuid::new_v4()).expect("sign");
        // Flip a character in the middle of the signature segment.
        let mut chars: Vec<char> = token.chars().collect();
        let i = chars.len() - 10;
        chars[i] = if chars[i] == 'x' { 'y' } else { 'x' };
        let tampered: String = chars.into_iter().collect();
        assert!(keys.verify(&tampered).is_none());
    }

    #[tokio::test]
    async fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            algorithm: Algorithm::HS256,
            ttl: Duration::minutes(5),
        };
        let token = other.sign(Uuid::new_v4()).expect("sign");
        assert!(keys.verify(&token).is_none());
    }
}

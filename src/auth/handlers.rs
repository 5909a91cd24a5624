use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    app::internal_error,
    auth::{
        dto::{LoginForm, TokenResponse},
        jwt::{CurrentUser, JwtKeys},
        password::{hash_password, verify_password},
    },
    state::AppState,
    users::{
        dto::{CreateUserRequest, UserResponse},
        repo::User,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/refresh", post(refresh))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), (StatusCode, String)> {
    payload
        .validate()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(internal_error)?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::BAD_REQUEST, "Email already registered".into()));
    }

    let hash = hash_password(&payload.password).map_err(internal_error)?;
    let user = User::create(
        &state.db,
        &payload.email,
        &hash,
        &payload.full_name,
        payload.is_admin,
    )
    .await
    .map_err(internal_error)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, form))]
async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, (StatusCode, String)> {
    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            "Incorrect email or password".to_string(),
        )
    };

    let user = User::find_by_email(&state.db, &form.username)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            warn!(email = %form.username, "login unknown email");
            invalid()
        })?;

    let ok = verify_password(&form.password, &user.password_hash).map_err(internal_error)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id).map_err(internal_error)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse::bearer(access_token, user.into())))
}

#[instrument(skip_all)]
async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

#[instrument(skip_all)]
async fn refresh(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<TokenResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id).map_err(internal_error)?;
    Ok(Json(TokenResponse::bearer(access_token, user.into())))
}

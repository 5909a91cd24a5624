use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app::internal_error,
    auth::jwt::{AdminUser, CurrentUser},
    auth::password::hash_password,
    state::AppState,
    users::{
        dto::{CreateUserRequest, UpdateUserRequest, UserResponse},
        repo::{User, UserChanges},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(get_me).put(update_me))
        .route(
            "/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip_all)]
async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserResponse>>, (StatusCode, String)> {
    let users = User::list(&state.db).await.map_err(internal_error)?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip_all)]
async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

#[instrument(skip(state, payload))]
async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    let updated = apply_user_update(&state, user, payload).await?;
    Ok(Json(updated.into()))
}

#[instrument(skip(state, _admin))]
async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, _admin, payload))]
async fn create_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
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

    info!(user_id = %user.id, email = %user.email, "user created by admin");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, _admin, payload))]
async fn update_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let updated = apply_user_update(&state, user, payload).await?;
    Ok(Json(updated.into()))
}

#[instrument(skip(state, _admin))]
async fn delete_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    if user.is_admin {
        warn!(user_id = %user.id, "refusing to delete admin user");
        return Err((StatusCode::FORBIDDEN, "Cannot delete admin users".into()));
    }

    User::delete(&state.db, user.id)
        .await
        .map_err(internal_error)?;

    info!(user_id = %user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Shared allow-listed merge for self and admin updates: validates the
/// payload, pre-checks email uniqueness, hashes a new password if present.
async fn apply_user_update(
    state: &AppState,
    user: User,
    payload: UpdateUserRequest,
) -> Result<User, (StatusCode, String)> {
    payload
        .validate()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    if let Some(email) = &payload.email {
        if *email != user.email
            && User::find_by_email(&state.db, email)
                .await
                .map_err(internal_error)?
                .is_some()
        {
            return Err((StatusCode::BAD_REQUEST, "Email already registered".into()));
        }
    }

    let password_hash = match &payload.password {
        Some(password) => Some(hash_password(password).map_err(internal_error)?),
        None => None,
    };

    let changes = UserChanges {
        email: payload.email,
        full_name: payload.full_name,
        password_hash,
    };

    User::update(&state.db, user.id, changes)
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))
}

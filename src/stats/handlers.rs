use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use time::{Duration, OffsetDateTime};
use tracing::instrument;

use crate::{
    app::internal_error,
    auth::jwt::{AdminUser, CurrentUser},
    state::AppState,
    stats::{
        dto::{RecentActivity, RecentTask, UserStats, UserSummary},
        repo,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats/user-summary", get(user_summary))
        .route("/stats/top-users", get(top_users))
        .route("/stats/recent-activity", get(recent_activity))
}

#[instrument(skip_all)]
async fn user_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserSummary>, (StatusCode, String)> {
    let totals = repo::totals_for_user(&state.db, user.id)
        .await
        .map_err(internal_error)?;
    Ok(Json(totals.into()))
}

#[instrument(skip_all)]
async fn top_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserStats>>, (StatusCode, String)> {
    let rows = repo::totals_by_user(&state.db)
        .await
        .map_err(internal_error)?;
    Ok(Json(rows.into_iter().map(UserStats::from).collect()))
}

#[instrument(skip_all)]
async fn recent_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<RecentActivity>, (StatusCode, String)> {
    let since = OffsetDateTime::now_utc() - Duration::days(7);
    let tasks = repo::recently_updated(&state.db, user.id, since, 10)
        .await
        .map_err(internal_error)?;
    Ok(Json(RecentActivity {
        recent_tasks: tasks.into_iter().map(RecentTask::from).collect(),
    }))
}

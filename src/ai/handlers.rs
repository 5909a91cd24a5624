use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    ai::dto::{DailyPlanResponse, SuggestionRequest, SuggestionResponse},
    app::internal_error,
    auth::jwt::CurrentUser,
    state::AppState,
    tasks::repo::Task,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/suggest-description", post(suggest_description))
        .route("/ai/daily-plan", get(daily_plan))
}

#[instrument(skip(state, _user, payload))]
async fn suggest_description(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(payload): Json<SuggestionRequest>,
) -> Result<Json<SuggestionResponse>, (StatusCode, String)> {
    payload
        .validate()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let response = state
        .ai
        .suggest_task_description(&payload.title, payload.context.as_deref())
        .await;
    Ok(Json(response))
}

#[instrument(skip_all)]
async fn daily_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DailyPlanResponse>, (StatusCode, String)> {
    let tasks = Task::list_active_for_user(&state.db, user.id)
        .await
        .map_err(internal_error)?;

    let plan = state.ai.generate_daily_plan(&user.full_name, &tasks).await;
    Ok(Json(plan))
}

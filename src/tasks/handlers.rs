use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app::internal_error,
    auth::jwt::{AdminUser, CurrentUser},
    state::AppState,
    tasks::{
        dto::{
            AssignmentRequest, CreateTaskRequest, ListTasksQuery, StatusUpdateRequest,
            TaskResponse, TimeUpdateRequest, UpdateTaskRequest,
        },
        repo::{Task, TaskChanges},
    },
    users::repo::User,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/admin/all", get(list_all_tasks))
        .route(
            "/tasks/:task_id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/:task_id/status", patch(update_status))
        .route("/tasks/:task_id/time", patch(add_time))
        .route("/tasks/:task_id/assign", patch(assign_task))
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Task not found".to_string())
}

#[instrument(skip(state, user))]
async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskResponse>>, (StatusCode, String)> {
    let tasks = Task::list_visible(&state.db, user.id, query.assigned_to_me, query.status_filter)
        .await
        .map_err(internal_error)?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

#[instrument(skip(state, user, payload))]
async fn create_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), (StatusCode, String)> {
    payload
        .validate()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    if let Some(assigned_to) = payload.assigned_to {
        if assigned_to != user.id {
            if !user.is_admin {
                return Err((
                    StatusCode::FORBIDDEN,
                    "Only admins can assign tasks to others".into(),
                ));
            }
            if User::find_by_id(&state.db, assigned_to)
                .await
                .map_err(internal_error)?
                .is_none()
            {
                return Err((StatusCode::NOT_FOUND, "User not found".into()));
            }
        }
    }

    // Unassigned tasks land on their creator.
    let assigned_to = payload.assigned_to.unwrap_or(user.id);

    let task = Task::create(
        &state.db,
        &payload.title,
        payload.description.as_deref(),
        user.id,
        assigned_to,
    )
    .await
    .map_err(internal_error)?;

    info!(task_id = %task.id, user_id = %user.id, "task created");
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[instrument(skip(state, user))]
async fn get_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskResponse>, (StatusCode, String)> {
    let task = Task::get_visible(&state.db, task_id, user.id)
        .await
        .map_err(internal_error)?
        .ok_or_else(not_found)?;
    Ok(Json(task.into()))
}

#[instrument(skip(state, user, payload))]
async fn update_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, (StatusCode, String)> {
    payload
        .validate()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let changes = TaskChanges {
        title: payload.title,
        description: payload.description,
        status: payload.status,
    };

    let task = Task::update_owned(&state.db, task_id, user.id, changes)
        .await
        .map_err(internal_error)?
        .ok_or_else(not_found)?;
    Ok(Json(task.into()))
}

#[instrument(skip(state, user, payload))]
async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<TaskResponse>, (StatusCode, String)> {
    let task = Task::set_status(&state.db, task_id, user.id, payload.status)
        .await
        .map_err(internal_error)?
        .ok_or_else(not_found)?;
    Ok(Json(task.into()))
}

#[instrument(skip(state, user, payload))]
async fn add_time(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<TimeUpdateRequest>,
) -> Result<Json<TaskResponse>, (StatusCode, String)> {
    payload
        .validate()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let task = Task::add_time(&state.db, task_id, user.id, payload.minutes_to_add)
        .await
        .map_err(internal_error)?
        .ok_or_else(not_found)?;

    info!(task_id = %task.id, minutes = payload.minutes_to_add, "time logged");
    Ok(Json(task.into()))
}

#[instrument(skip(state, user))]
async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let deleted = Task::delete_owned(&state.db, task_id, user.id)
        .await
        .map_err(internal_error)?;
    if !deleted {
        return Err(not_found());
    }

    info!(task_id = %task_id, user_id = %user.id, "task deleted");
    Ok(Json(json!({ "message": "Task successfully deleted" })))
}

#[instrument(skip(state, _admin, payload))]
async fn assign_task(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<AssignmentRequest>,
) -> Result<Json<TaskResponse>, (StatusCode, String)> {
    if Task::find_by_id(&state.db, task_id)
        .await
        .map_err(internal_error)?
        .is_none()
    {
        return Err(not_found());
    }

    if let Some(assigned_to) = payload.assigned_to {
        if User::find_by_id(&state.db, assigned_to)
            .await
            .map_err(internal_error)?
            .is_none()
        {
            warn!(task_id = %task_id, %assigned_to, "assignment target missing");
            return Err((StatusCode::NOT_FOUND, "Assigned user not found".into()));
        }
    }

    let task = Task::set_assignee(&state.db, task_id, payload.assigned_to)
        .await
        .map_err(internal_error)?
        .ok_or_else(not_found)?;

    info!(task_id = %task.id, assigned_to = ?task.assigned_to, "task reassigned");
    Ok(Json(task.into()))
}

#[instrument(skip_all)]
async fn list_all_tasks(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<TaskResponse>>, (StatusCode, String)> {
    let tasks = Task::list_all(&state.db).await.map_err(internal_error)?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

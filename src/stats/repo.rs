use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::tasks::repo::Task;

/// Aggregate counters over one user's created tasks.
#[derive(Debug, FromRow)]
pub struct TaskTotals {
    pub total_tasks: i64,
    pub todo_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,
    pub total_minutes: i64,
}

pub async fn totals_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<TaskTotals> {
    let totals = sqlx::query_as::<_, TaskTotals>(
        r#"
        SELECT COUNT(*) AS total_tasks,
               COUNT(*) FILTER (WHERE status = 'TODO') AS todo_tasks,
               COUNT(*) FILTER (WHERE status = 'IN_PROGRESS') AS in_progress_tasks,
               COUNT(*) FILTER (WHERE status = 'DONE') AS completed_tasks,
               COALESCE(SUM(total_minutes), 0) AS total_minutes
        FROM tasks
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(totals)
}

/// One leaderboard row per user, including users with no tasks.
#[derive(Debug, FromRow)]
pub struct UserTotalsRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub total_minutes: i64,
}

pub async fn totals_by_user(db: &PgPool) -> anyhow::Result<Vec<UserTotalsRow>> {
    let rows = sqlx::query_as::<_, UserTotalsRow>(
        r#"
        SELECT u.id, u.full_name, u.email,
               COUNT(t.id) AS total_tasks,
               COUNT(t.id) FILTER (WHERE t.status = 'DONE') AS completed_tasks,
               COALESCE(SUM(t.total_minutes), 0) AS total_minutes
        FROM users u
        LEFT JOIN tasks t ON t.user_id = u.id
        GROUP BY u.id, u.full_name, u.email
        ORDER BY COALESCE(SUM(t.total_minutes), 0) DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn recently_updated(
    db: &PgPool,
    user_id: Uuid,
    since: OffsetDateTime,
    limit: i64,
) -> anyhow::Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, title, description, status, total_minutes, user_id, assigned_to,
               created_at, updated_at
        FROM tasks
        WHERE user_id = $1 AND updated_at >= $2
        ORDER BY updated_at DESC
        LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(since)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(tasks)
}

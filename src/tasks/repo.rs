use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Maps the `taskstatus` Postgres enum. No transition rules: any status may be
/// set at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "taskstatus", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub total_minutes: i32,
    pub user_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const TASK_COLUMNS: &str =
    "id, title, description, status, total_minutes, user_id, assigned_to, created_at, updated_at";

/// Allow-listed task update. `total_minutes` and `assigned_to` are deliberately
/// absent: time is added through [`Task::add_time`] and assignment goes through
/// the admin-only [`Task::set_assignee`].
#[derive(Debug, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl Task {
    /// Tasks visible to `user_id`: either the assigned-to-me view (assigned to
    /// them, or created by them and unassigned) or plain created-by-me.
    pub async fn list_visible(
        db: &PgPool,
        user_id: Uuid,
        assigned_to_me: bool,
        status: Option<TaskStatus>,
    ) -> anyhow::Result<Vec<Task>> {
        let scope = if assigned_to_me {
            "(assigned_to = $1 OR (user_id = $1 AND assigned_to IS NULL))"
        } else {
            "user_id = $1"
        };
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE {scope}");
        if status.is_some() {
            sql.push_str(" AND status = $2");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query_as::<_, Task>(&sql).bind(user_id);
        if let Some(status) = status {
            query = query.bind(status);
        }
        Ok(query.fetch_all(db).await?)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(tasks)
    }

    /// The caller's open work, newest first, for daily planning.
    pub async fn list_active_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE user_id = $1 AND status IN ('TODO', 'IN_PROGRESS')
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(tasks)
    }

    pub async fn create(
        db: &PgPool,
        title: &str,
        description: Option<&str>,
        user_id: Uuid,
        assigned_to: Uuid,
    ) -> anyhow::Result<Task> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, user_id, assigned_to)
            VALUES ($1, $2, $3, $4)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(description)
        .bind(user_id)
        .bind(assigned_to)
        .fetch_one(db)
        .await?;
        Ok(task)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(task)
    }

    /// Single-task read: creator or assignee may see it.
    pub async fn get_visible(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE id = $1 AND (user_id = $2 OR assigned_to = $2)
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(task)
    }

    /// Creator-scoped allow-listed merge; absent fields keep their value.
    pub async fn update_owned(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        changes: TaskChanges,
    ) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.status)
        .fetch_optional(db)
        .await?;
        Ok(task)
    }

    pub async fn set_status(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        status: TaskStatus,
    ) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(status)
        .fetch_optional(db)
        .await?;
        Ok(task)
    }

    /// Atomic increment so concurrent logs never lose an update.
    pub async fn add_time(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        minutes: i32,
    ) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET total_minutes = total_minutes + $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(minutes)
        .fetch_optional(db)
        .await?;
        Ok(task)
    }

    /// Admin reassignment; `None` clears the assignee.
    pub async fn set_assignee(
        db: &PgPool,
        id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET assigned_to = $2, updated_at = now()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(assigned_to)
        .fetch_optional(db)
        .await?;
        Ok(task)
    }

    pub async fn delete_owned(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"TODO\"").unwrap(),
            TaskStatus::Todo
        );
        assert!(serde_json::from_str::<TaskStatus>("\"BOGUS\"").is_err());
    }
}

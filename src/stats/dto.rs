use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{TaskTotals, UserTotalsRow};
use crate::tasks::repo::{Task, TaskStatus};

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percent(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        round2(part as f64 / whole as f64 * 100.0)
    } else {
        0.0
    }
}

/// Caller's task summary. Rates are percentages rounded to 2 decimals; a user
/// with no tasks reports zeros.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub total_tasks: i64,
    pub todo_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,
    pub total_minutes_logged: i64,
    pub average_minutes_per_task: f64,
    pub completion_rate: f64,
}

impl From<TaskTotals> for UserSummary {
    fn from(t: TaskTotals) -> Self {
        let average = if t.total_tasks > 0 {
            round2(t.total_minutes as f64 / t.total_tasks as f64)
        } else {
            0.0
        };
        Self {
            total_tasks: t.total_tasks,
            todo_tasks: t.todo_tasks,
            in_progress_tasks: t.in_progress_tasks,
            completed_tasks: t.completed_tasks,
            total_minutes_logged: t.total_minutes,
            average_minutes_per_task: average,
            completion_rate: percent(t.completed_tasks, t.total_tasks),
        }
    }
}

/// Leaderboard entry.
#[derive(Debug, Serialize)]
pub struct UserStats {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub total_minutes: i64,
    pub completion_rate: f64,
}

impl From<UserTotalsRow> for UserStats {
    fn from(r: UserTotalsRow) -> Self {
        let completion_rate = percent(r.completed_tasks, r.total_tasks);
        Self {
            user_id: r.id,
            full_name: r.full_name,
            email: r.email,
            total_tasks: r.total_tasks,
            completed_tasks: r.completed_tasks,
            total_minutes: r.total_minutes,
            completion_rate,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecentTask {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub total_minutes: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct RecentActivity {
    pub recent_tasks: Vec<RecentTask>,
}

impl From<Task> for RecentTask {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            status: t.status,
            total_minutes: t.total_minutes,
            updated_at: t.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(total: i64, done: i64, minutes: i64) -> TaskTotals {
        TaskTotals {
            total_tasks: total,
            todo_tasks: 0,
            in_progress_tasks: 0,
            completed_tasks: done,
            total_minutes: minutes,
        }
    }

    #[test]
    fn rounding_to_two_decimals() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn summary_with_no_tasks_is_all_zeros() {
        let summary = UserSummary::from(totals(0, 0, 0));
        assert_eq!(summary.total_tasks, 0);
        assert_eq!(summary.average_minutes_per_task, 0.0);
        assert_eq!(summary.completion_rate, 0.0);
    }

    #[test]
    fn summary_rates() {
        let summary = UserSummary::from(totals(3, 2, 100));
        assert_eq!(summary.average_minutes_per_task, 33.33);
        assert_eq!(summary.completion_rate, 66.67);
    }

    #[test]
    fn leaderboard_row_with_no_tasks() {
        let stats = UserStats::from(UserTotalsRow {
            id: Uuid::new_v4(),
            full_name: "Idle User".into(),
            email: "idle@example.com".into(),
            total_tasks: 0,
            completed_tasks: 0,
            total_minutes: 0,
        });
        assert_eq!(stats.completion_rate, 0.0);
    }
}

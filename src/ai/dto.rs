use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    pub title: String,
    pub context: Option<String>,
}

impl SuggestionRequest {
    pub(crate) fn validate(&self) -> Result<(), String> {
        let len = self.title.chars().count();
        if len == 0 || len > 200 {
            return Err("Title must be 1-200 characters".into());
        }
        if let Some(context) = &self.context {
            if context.chars().count() > 500 {
                return Err("Context must be at most 500 characters".into());
            }
        }
        Ok(())
    }
}

/// `success` is always true; `fallback` records whether the local heuristic
/// produced the result instead of the completion API.
#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub suggestion: String,
    pub success: bool,
    pub fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailyPlanTask {
    pub title: String,
    pub estimated_minutes: i32,
    pub priority: Priority,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DailyPlanResponse {
    pub tasks: Vec<DailyPlanTask>,
    pub total_estimated_minutes: i32,
    pub plan_summary: String,
    pub success: bool,
    pub fallback: bool,
}

/// Shape the completion API must return for a daily plan. Anything that does
/// not parse into this triggers the fallback planner.
#[derive(Debug, Deserialize)]
pub struct PlanPayload {
    pub tasks: Vec<DailyPlanTask>,
    pub total_estimated_minutes: i32,
    pub plan_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_request_bounds() {
        let ok = SuggestionRequest {
            title: "Fix login".into(),
            context: None,
        };
        assert!(ok.validate().is_ok());

        let empty = SuggestionRequest {
            title: String::new(),
            context: None,
        };
        assert!(empty.validate().is_err());

        let long_context = SuggestionRequest {
            title: "Fix login".into(),
            context: Some("c".repeat(501)),
        };
        assert!(long_context.validate().is_err());
    }

    #[test]
    fn plan_payload_parses_strict_json() {
        let payload: PlanPayload = serde_json::from_str(
            r#"{
                "tasks": [
                    {"title": "Ship it", "estimated_minutes": 60, "priority": "high", "description": null}
                ],
                "total_estimated_minutes": 60,
                "plan_summary": "One focused hour."
            }"#,
        )
        .unwrap();
        assert_eq!(payload.tasks.len(), 1);
        assert_eq!(payload.tasks[0].priority, Priority::High);
    }

    #[test]
    fn plan_payload_rejects_unknown_priority() {
        let result = serde_json::from_str::<PlanPayload>(
            r#"{"tasks": [{"title": "x", "estimated_minutes": 1, "priority": "urgent"}],
                "total_estimated_minutes": 1, "plan_summary": "s"}"#,
        );
        assert!(result.is_err());
    }
}

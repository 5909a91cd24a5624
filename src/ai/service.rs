use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::ai::dto::{DailyPlanResponse, DailyPlanTask, PlanPayload, Priority, SuggestionResponse};
use crate::config::AiConfig;
use crate::tasks::repo::{Task, TaskStatus};

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion API returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("completion response carried no content")]
    MissingContent,
}

/// One round-trip to a chat-completion API. Kept behind a trait so tests can
/// substitute canned replies.
#[async_trait]
pub trait ChatCompletions: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, max_tokens: u32, temperature: f32) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatCompletions for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let response = self
            .http
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CompletionError::Status(response.status()));
        }

        let payload: ChatResponse = response.json().await?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(CompletionError::MissingContent)?;
        Ok(content.trim().to_string())
    }
}

/// AI assistance with deterministic local fallbacks. Constructed once from
/// config and injected through `AppState`; without an API key every request
/// takes the fallback path.
pub struct AiService {
    client: Option<Arc<dyn ChatCompletions>>,
}

impl AiService {
    pub fn from_config(config: &AiConfig) -> Self {
        let client = match &config.api_key {
            Some(key) => Some(Arc::new(OpenAiClient::new(
                key.clone(),
                config.model.clone(),
                config.max_tokens,
                config.temperature,
            )) as Arc<dyn ChatCompletions>),
            None => {
                warn!("no OpenAI key, using fallbacks");
                None
            }
        };
        Self { client }
    }

    #[cfg(test)]
    pub fn with_client(client: Option<Arc<dyn ChatCompletions>>) -> Self {
        Self { client }
    }

    pub async fn suggest_task_description(
        &self,
        title: &str,
        context: Option<&str>,
    ) -> SuggestionResponse {
        let Some(client) = &self.client else {
            return fallback_description(title);
        };

        let prompt = suggestion_prompt(title, context);
        match client
            .complete("You are a helpful project management assistant.", &prompt)
            .await
        {
            Ok(suggestion) => {
                info!(title, "generated task description");
                SuggestionResponse {
                    suggestion,
                    success: true,
                    fallback: false,
                }
            }
            Err(e) => {
                error!(error = %e, title, "failed to generate task description");
                fallback_description(title)
            }
        }
    }

    pub async fn generate_daily_plan(&self, full_name: &str, tasks: &[Task]) -> DailyPlanResponse {
        let Some(client) = &self.client else {
            return fallback_daily_plan(tasks);
        };

        let prompt = plan_prompt(full_name, tasks);
        let content = match client
            .complete("You respond with valid JSON only.", &prompt)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                error!(error = %e, "failed to generate daily plan");
                return fallback_daily_plan(tasks);
            }
        };

        match serde_json::from_str::<PlanPayload>(content.trim()) {
            Ok(payload) => DailyPlanResponse {
                tasks: payload.tasks,
                total_estimated_minutes: payload.total_estimated_minutes,
                plan_summary: payload.plan_summary,
                success: true,
                fallback: false,
            },
            Err(e) => {
                error!(error = %e, "daily plan response was not the expected JSON");
                fallback_daily_plan(tasks)
            }
        }
    }
}

fn suggestion_prompt(title: &str, context: Option<&str>) -> String {
    let context_line = context
        .map(|c| format!("Context: {c}\n"))
        .unwrap_or_default();
    format!(
        "Create a task description for: \"{title}\"\n{context_line}\n\
         Include what needs to be done, acceptance criteria, and complexity estimate.\n\
         Max 500 words."
    )
}

fn plan_prompt(full_name: &str, tasks: &[Task]) -> String {
    let items: Vec<serde_json::Value> = tasks
        .iter()
        .map(|t| {
            json!({
                "title": t.title,
                "description": t.description.as_deref().unwrap_or("No description"),
                "status": t.status,
                "total_minutes": t.total_minutes,
            })
        })
        .collect();
    format!(
        "Plan daily work for {full_name}.\nTasks: {}\n\n\
         Return JSON with:\n\
         - tasks: [{{\"title\", \"estimated_minutes\", \"priority\", \"description\"}}]\n\
         - total_estimated_minutes: total\n\
         - plan_summary: brief overview\n\n\
         Focus on TODO and IN_PROGRESS. 8 hour max.",
        serde_json::Value::Array(items)
    )
}

/// Canned instructions keyed by title substring, checked in priority order.
const FALLBACK_TEMPLATES: &[(&str, &str)] = &[
    ("bug", "Fix the bug. Reproduce, identify cause, implement fix, test."),
    ("feature", "Build the feature. Design, implement, test, document."),
    (
        "refactor",
        "Clean up code. Analyze current state, refactor incrementally, test.",
    ),
    ("review", "Review the item. Check requirements, provide feedback."),
    ("test", "Write tests. Design test cases, implement, verify coverage."),
];

const GENERIC_TEMPLATE: &str =
    "Add detailed requirements and acceptance criteria. Break down if complex.";

pub(crate) fn fallback_description(title: &str) -> SuggestionResponse {
    let title_lower = title.to_lowercase();
    let suggestion = FALLBACK_TEMPLATES
        .iter()
        .find(|(keyword, _)| title_lower.contains(keyword))
        .map(|(_, template)| format!("{template}\n\nCustomize as needed."))
        .unwrap_or_else(|| GENERIC_TEMPLATE.to_string());

    SuggestionResponse {
        suggestion,
        success: true,
        fallback: true,
    }
}

/// Greedy two-tier packer: up to 2 in-progress tasks at 120 minutes each, then
/// up to 3 TODO tasks at 90 minutes each, stopping before an addition once the
/// running total has reached the 420-minute day.
pub(crate) fn fallback_daily_plan(tasks: &[Task]) -> DailyPlanResponse {
    const CONTINUE_MINUTES: i32 = 120;
    const START_MINUTES: i32 = 90;
    const DAY_BUDGET_MINUTES: i32 = 420;

    let in_progress: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::InProgress)
        .collect();
    let todo: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Todo)
        .collect();

    let mut plan = Vec::new();
    let mut total = 0;

    for task in in_progress.iter().take(2) {
        plan.push(DailyPlanTask {
            title: task.title.clone(),
            estimated_minutes: CONTINUE_MINUTES,
            priority: Priority::High,
            description: Some(format!(
                "Continue: {}",
                task.description.as_deref().unwrap_or("No description")
            )),
        });
        total += CONTINUE_MINUTES;
    }

    for task in todo.iter().take(3) {
        if total >= DAY_BUDGET_MINUTES {
            break;
        }
        plan.push(DailyPlanTask {
            title: task.title.clone(),
            estimated_minutes: START_MINUTES,
            priority: Priority::Medium,
            description: Some(format!(
                "Start: {}",
                task.description.as_deref().unwrap_or("No description")
            )),
        });
        total += START_MINUTES;
    }

    let plan_summary = format!(
        "Focus on {} current tasks and {} new ones. ~{}h workload.",
        in_progress.len(),
        todo.len().min(3),
        total / 60
    );

    DailyPlanResponse {
        tasks: plan,
        total_estimated_minutes: total,
        plan_summary,
        success: true,
        fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn make_task(title: &str, description: Option<&str>, status: TaskStatus) -> Task {
        let now = OffsetDateTime::now_utc();
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.map(String::from),
            status,
            total_minutes: 0,
            user_id: Uuid::new_v4(),
            assigned_to: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fallback_description_matches_bug_template() {
        let response = fallback_description("Fix critical bug in login");
        assert!(response.suggestion.starts_with("Fix the bug."));
        assert!(response.suggestion.ends_with("Customize as needed."));
        assert!(response.success);
        assert!(response.fallback);
    }

    #[test]
    fn fallback_description_is_case_insensitive() {
        let response = fallback_description("REFACTOR the settings page");
        assert!(response.suggestion.starts_with("Clean up code."));
    }

    #[test]
    fn fallback_description_prefers_earlier_keywords() {
        // Both "bug" and "feature" appear; "bug" has higher priority.
        let response = fallback_description("New feature to track bug reports");
        assert!(response.suggestion.starts_with("Fix the bug."));
    }

    #[test]
    fn fallback_description_generic_when_no_keyword() {
        let response = fallback_description("Organize team offsite");
        assert_eq!(response.suggestion, GENERIC_TEMPLATE);
    }

    #[test]
    fn fallback_plan_packs_two_tiers_up_to_the_budget() {
        let mut tasks = Vec::new();
        for i in 0..3 {
            tasks.push(make_task(
                &format!("wip {i}"),
                Some("desc"),
                TaskStatus::InProgress,
            ));
        }
        for i in 0..5 {
            tasks.push(make_task(&format!("todo {i}"), None, TaskStatus::Todo));
        }

        let plan = fallback_daily_plan(&tasks);

        // 2 high entries, then mediums until an addition would pass 420.
        assert_eq!(plan.tasks.len(), 4);
        assert!(plan.tasks[..2]
            .iter()
            .all(|t| t.priority == Priority::High && t.estimated_minutes == 120));
        assert!(plan.tasks[2..]
            .iter()
            .all(|t| t.priority == Priority::Medium && t.estimated_minutes == 90));
        assert_eq!(plan.total_estimated_minutes, 420);
        assert_eq!(
            plan.plan_summary,
            "Focus on 3 current tasks and 3 new ones. ~7h workload."
        );
        assert!(plan.success);
        assert!(plan.fallback);
    }

    #[test]
    fn fallback_plan_descriptions_carry_prefixes() {
        let tasks = vec![
            make_task("wip", Some("halfway there"), TaskStatus::InProgress),
            make_task("fresh", None, TaskStatus::Todo),
        ];
        let plan = fallback_daily_plan(&tasks);
        assert_eq!(
            plan.tasks[0].description.as_deref(),
            Some("Continue: halfway there")
        );
        assert_eq!(
            plan.tasks[1].description.as_deref(),
            Some("Start: No description")
        );
    }

    #[test]
    fn fallback_plan_with_only_todos() {
        let tasks: Vec<Task> = (0..5)
            .map(|i| make_task(&format!("todo {i}"), None, TaskStatus::Todo))
            .collect();
        let plan = fallback_daily_plan(&tasks);
        assert_eq!(plan.tasks.len(), 3);
        assert_eq!(plan.total_estimated_minutes, 270);
        assert_eq!(
            plan.plan_summary,
            "Focus on 0 current tasks and 3 new ones. ~4h workload."
        );
    }

    #[test]
    fn fallback_plan_with_no_tasks() {
        let plan = fallback_daily_plan(&[]);
        assert!(plan.tasks.is_empty());
        assert_eq!(plan.total_estimated_minutes, 0);
        assert_eq!(
            plan.plan_summary,
            "Focus on 0 current tasks and 0 new ones. ~0h workload."
        );
    }

    #[test]
    fn fallback_plan_ignores_done_tasks() {
        let tasks = vec![
            make_task("shipped", None, TaskStatus::Done),
            make_task("wip", None, TaskStatus::InProgress),
        ];
        let plan = fallback_daily_plan(&tasks);
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].priority, Priority::High);
    }

    struct StubCompletions {
        reply: Option<String>,
    }

    #[async_trait]
    impl ChatCompletions for StubCompletions {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
            self.reply.clone().ok_or(CompletionError::MissingContent)
        }
    }

    fn service_with_reply(reply: Option<&str>) -> AiService {
        AiService::with_client(Some(Arc::new(StubCompletions {
            reply: reply.map(String::from),
        })))
    }

    #[tokio::test]
    async fn suggestion_without_client_falls_back() {
        let service = AiService::with_client(None);
        let response = service
            .suggest_task_description("Fix critical bug in login", None)
            .await;
        assert!(response.fallback);
        assert!(response.success);
    }

    #[tokio::test]
    async fn suggestion_uses_completion_reply() {
        let service = service_with_reply(Some("A thorough description."));
        let response = service.suggest_task_description("Fix login", None).await;
        assert_eq!(response.suggestion, "A thorough description.");
        assert!(!response.fallback);
    }

    #[tokio::test]
    async fn suggestion_absorbs_completion_errors() {
        let service = service_with_reply(None);
        let response = service
            .suggest_task_description("Fix critical bug in login", None)
            .await;
        assert!(response.fallback);
        assert!(response.suggestion.starts_with("Fix the bug."));
    }

    #[tokio::test]
    async fn plan_parses_structured_reply() {
        let service = service_with_reply(Some(
            r#"{"tasks": [{"title": "Ship", "estimated_minutes": 60, "priority": "high", "description": "Go"}],
                "total_estimated_minutes": 60, "plan_summary": "Short day."}"#,
        ));
        let plan = service.generate_daily_plan("Demo User", &[]).await;
        assert!(!plan.fallback);
        assert_eq!(plan.total_estimated_minutes, 60);
        assert_eq!(plan.plan_summary, "Short day.");
    }

    #[tokio::test]
    async fn plan_falls_back_on_malformed_reply() {
        let service = service_with_reply(Some("certainly! here is your plan:"));
        let tasks = vec![make_task("wip", None, TaskStatus::InProgress)];
        let plan = service.generate_daily_plan("Demo User", &tasks).await;
        assert!(plan.fallback);
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.total_estimated_minutes, 120);
    }

    #[tokio::test]
    async fn plan_falls_back_on_completion_error() {
        let service = service_with_reply(None);
        let plan = service.generate_daily_plan("Demo User", &[]).await;
        assert!(plan.fallback);
        assert!(plan.tasks.is_empty());
    }
}

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::paths::Team;

/// Value of the `source` front-matter field for documents this tool writes.
pub const LOG_SOURCE: &str = "hub-sync";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blockers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiLearning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_to: Option<String>,
}

/// Structured payload optionally attached to a push, so other agents can
/// parse the day's work without scraping the prose body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredUpdate {
    #[serde(default)]
    pub done: Vec<Task>,
    #[serde(default)]
    pub in_progress: Vec<Task>,
    #[serde(default)]
    pub tomorrow: Vec<Task>,
    #[serde(default)]
    pub ai_learning: Option<AiLearning>,
}

impl StructuredUpdate {
    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
            && self.in_progress.is_empty()
            && self.tomorrow.is_empty()
            && self.ai_learning.is_none()
    }
}

/// One member's daily log, fully assembled. At most one document exists per
/// (member, team, date); a push replaces the prior revision wholesale.
#[derive(Debug, Clone)]
pub struct LogDocument {
    pub member_id: String,
    pub member_name: String,
    pub team: Team,
    pub date: String,
    pub synced_at: String,
    pub source: String,
    pub tasks_done: Vec<Task>,
    pub tasks_in_progress: Vec<Task>,
    pub tasks_tomorrow: Vec<Task>,
    pub ai_learning: Option<AiLearning>,
    /// Aggregate of every in-progress task's blockers, surfaced at the top
    /// level so other agents can query it without walking the task lists.
    pub blockers: Vec<String>,
    pub body: String,
}

impl LogDocument {
    pub fn new(
        member_id: &str,
        member_name: &str,
        team: Team,
        date: &str,
        body: &str,
        structured: Option<StructuredUpdate>,
    ) -> Self {
        let structured = structured.unwrap_or_default();
        let blockers = structured
            .in_progress
            .iter()
            .flat_map(|task| task.blockers.iter().cloned())
            .collect();
        Self {
            member_id: member_id.to_string(),
            member_name: member_name.to_string(),
            team,
            date: date.to_string(),
            synced_at: Local::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            source: LOG_SOURCE.to_string(),
            tasks_done: structured.done,
            tasks_in_progress: structured.in_progress,
            tasks_tomorrow: structured.tomorrow,
            ai_learning: structured.ai_learning,
            blockers,
            body: body.to_string(),
        }
    }

    pub fn has_structured_data(&self) -> bool {
        !self.tasks_done.is_empty()
            || !self.tasks_in_progress.is_empty()
            || !self.tasks_tomorrow.is_empty()
            || self.ai_learning.is_some()
    }
}

/// A raw log document fetched from the hub, as fed to the search engine.
#[derive(Debug, Clone)]
pub struct LogFile {
    pub member_id: String,
    pub date: String,
    pub url: String,
    pub text: String,
}

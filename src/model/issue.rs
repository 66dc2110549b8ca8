use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open issue addressed to the tracked member. Rebuilt from the API on
/// every run; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedIssue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

/// A comment on a tracked issue. Transient, like [`TrackedIssue`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedComment {
    pub id: u64,
    pub issue_number: u64,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

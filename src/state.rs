use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::warn;

/// Everything the issue monitor remembers between invocations: which issues
/// and comments it has already handled, and when it last ran. Single writer,
/// single reader; concurrent invocations are out of scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default)]
    pub replied_issues: BTreeSet<u64>,
    #[serde(default)]
    pub replied_comments: BTreeSet<u64>,
    #[serde(default)]
    pub last_check: Option<String>,
}

pub struct StateStore {
    path: PathBuf,
    state: SyncState,
}

impl StateStore {
    /// A missing file yields the zero-valued state. Unparseable content
    /// resets to zero with a warning; a read failure on an existing file is
    /// a real error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(err) => {
                    warn!(path = %path.display(), %err, "state file unparseable, starting fresh");
                    SyncState::default()
                }
            }
        } else {
            SyncState::default()
        };
        Ok(Self { path, state })
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn mark_issue_replied(&mut self, issue_number: u64) -> Result<()> {
        self.state.replied_issues.insert(issue_number);
        self.touch();
        self.save()
    }

    pub fn mark_comment_replied(&mut self, comment_id: u64) -> Result<()> {
        self.state.replied_comments.insert(comment_id);
        self.touch();
        self.save()
    }

    fn touch(&mut self) {
        self.state.last_check = Some(Utc::now().to_rfc3339());
    }

    /// Write to a sibling temp file and rename over the target, so an
    /// interrupted save leaves the previous state intact.
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

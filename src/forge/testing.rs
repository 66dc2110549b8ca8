//! Recording mock for orchestration tests: scripted responses in, recorded
//! writes and posts out, with switchable failure injection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{ApiError, ApiResult, Forge, RemoteEntry, RemoteFile};
use crate::model::issue::{TrackedComment, TrackedIssue};

#[derive(Debug, Clone, PartialEq)]
pub struct WriteCall {
    pub path: String,
    pub text: String,
    pub message: String,
    pub replace_sha: Option<String>,
}

#[derive(Default)]
pub struct MockForge {
    pub user: String,
    files: HashMap<String, RemoteFile>,
    dirs: HashMap<String, Vec<RemoteEntry>>,
    raw: HashMap<String, String>,
    issues: Vec<TrackedIssue>,
    comments: HashMap<u64, Vec<TrackedComment>>,
    fail_posts: bool,
    fail_comments_for: HashSet<u64>,
    fail_files: HashSet<String>,
    pub writes: Mutex<Vec<WriteCall>>,
    pub posts: Mutex<Vec<(u64, String)>>,
    pub raw_fetches: Mutex<Vec<String>>,
}

impl MockForge {
    pub fn new() -> Self {
        Self {
            user: "mock-user".to_string(),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, path: &str, text: &str, sha: &str) -> Self {
        self.files.insert(
            path.to_string(),
            RemoteFile {
                text: text.to_string(),
                sha: sha.to_string(),
            },
        );
        self
    }

    pub fn with_dir(mut self, path: &str, entries: Vec<RemoteEntry>) -> Self {
        self.dirs.insert(path.to_string(), entries);
        self
    }

    pub fn with_raw(mut self, url: &str, text: &str) -> Self {
        self.raw.insert(url.to_string(), text.to_string());
        self
    }

    pub fn with_issue(mut self, issue: TrackedIssue, comments: Vec<TrackedComment>) -> Self {
        self.comments.insert(issue.number, comments);
        self.issues.push(issue);
        self
    }

    pub fn with_failing_posts(mut self) -> Self {
        self.fail_posts = true;
        self
    }

    pub fn with_failing_comments_for(mut self, issue_number: u64) -> Self {
        self.fail_comments_for.insert(issue_number);
        self
    }

    pub fn with_failing_file(mut self, path: &str) -> Self {
        self.fail_files.insert(path.to_string());
        self
    }
}

#[async_trait]
impl Forge for MockForge {
    async fn current_user(&self) -> ApiResult<String> {
        Ok(self.user.clone())
    }

    async fn repo_accessible(&self) -> ApiResult<()> {
        Ok(())
    }

    async fn read_file(&self, path: &str) -> ApiResult<Option<RemoteFile>> {
        if self.fail_files.contains(path) {
            return Err(ApiError::Status {
                status: 500,
                message: "mock failure".to_string(),
            });
        }
        Ok(self.files.get(path).cloned())
    }

    async fn write_file(
        &self,
        path: &str,
        text: &str,
        message: &str,
        replace_sha: Option<&str>,
    ) -> ApiResult<String> {
        self.writes.lock().unwrap().push(WriteCall {
            path: path.to_string(),
            text: text.to_string(),
            message: message.to_string(),
            replace_sha: replace_sha.map(str::to_string),
        });
        Ok(format!("https://mock.test/{path}"))
    }

    async fn list_dir(&self, path: &str) -> ApiResult<Vec<RemoteEntry>> {
        match self.dirs.get(path) {
            Some(entries) => Ok(entries.clone()),
            None => Err(ApiError::NotFound(path.to_string())),
        }
    }

    async fn fetch_raw(&self, url: &str) -> ApiResult<String> {
        self.raw_fetches.lock().unwrap().push(url.to_string());
        self.raw
            .get(url)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(url.to_string()))
    }

    async fn open_issues(&self) -> ApiResult<Vec<TrackedIssue>> {
        Ok(self.issues.clone())
    }

    async fn issue_comments(&self, issue_number: u64) -> ApiResult<Vec<TrackedComment>> {
        if self.fail_comments_for.contains(&issue_number) {
            return Err(ApiError::Status {
                status: 500,
                message: "mock failure".to_string(),
            });
        }
        Ok(self.comments.get(&issue_number).cloned().unwrap_or_default())
    }

    async fn post_comment(&self, issue_number: u64, body: &str) -> ApiResult<String> {
        if self.fail_posts {
            return Err(ApiError::Status {
                status: 500,
                message: "mock failure".to_string(),
            });
        }
        self.posts
            .lock()
            .unwrap()
            .push((issue_number, body.to_string()));
        Ok(format!(
            "https://mock.test/issues/{issue_number}#comment"
        ))
    }
}

pub fn dir_entry(name: &str) -> RemoteEntry {
    RemoteEntry {
        name: name.to_string(),
        is_dir: true,
        download_url: None,
        html_url: None,
    }
}

pub fn file_entry(name: &str, download_url: &str) -> RemoteEntry {
    RemoteEntry {
        name: name.to_string(),
        is_dir: false,
        download_url: Some(download_url.to_string()),
        html_url: Some(format!("{download_url}#html")),
    }
}

pub fn sample_issue(number: u64, title: &str, body: &str, author: &str) -> TrackedIssue {
    TrackedIssue {
        number,
        title: title.to_string(),
        body: body.to_string(),
        author: author.to_string(),
        created_at: ts("2024-05-01T08:00:00Z"),
        url: format!("https://mock.test/issues/{number}"),
    }
}

pub fn sample_comment(id: u64, issue_number: u64, author: &str, created_at: &str) -> TrackedComment {
    TrackedComment {
        id,
        issue_number,
        author: author.to_string(),
        body: format!("comment {id}"),
        created_at: ts(created_at),
        url: format!("https://mock.test/issues/{issue_number}#issuecomment-{id}"),
    }
}

fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("test timestamp")
        .with_timezone(&Utc)
}

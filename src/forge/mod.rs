pub mod github;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::issue::{TrackedComment, TrackedIssue};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Payload(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// A file fetched through the contents API: decoded text plus the blob SHA
/// required to replace it.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub text: String,
    pub sha: String,
}

/// One entry of a directory listing.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
    pub download_url: Option<String>,
    pub html_url: Option<String>,
}

/// The narrow interface to the hosted forge. Everything the sync and monitor
/// flows need, nothing more; swapping in a mock gives fully offline tests.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Login of the authenticated user.
    async fn current_user(&self) -> ApiResult<String>;
    async fn repo_accessible(&self) -> ApiResult<()>;
    /// 404 is a legitimate "does not exist yet" answer for file lookups, so
    /// it maps to `Ok(None)` rather than an error.
    async fn read_file(&self, path: &str) -> ApiResult<Option<RemoteFile>>;
    /// Create or (when `replace_sha` is given) update a file. Returns the
    /// html URL of the written file.
    async fn write_file(
        &self,
        path: &str,
        text: &str,
        message: &str,
        replace_sha: Option<&str>,
    ) -> ApiResult<String>;
    async fn list_dir(&self, path: &str) -> ApiResult<Vec<RemoteEntry>>;
    /// Unauthenticated fetch of a raw download URL.
    async fn fetch_raw(&self, url: &str) -> ApiResult<String>;
    async fn open_issues(&self) -> ApiResult<Vec<TrackedIssue>>;
    async fn issue_comments(&self, issue_number: u64) -> ApiResult<Vec<TrackedComment>>;
    /// Returns the html URL of the posted comment.
    async fn post_comment(&self, issue_number: u64, body: &str) -> ApiResult<String>;
}

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use super::{ApiError, ApiResult, Forge, RemoteEntry, RemoteFile};
use crate::config::{HubConfig, MissingToken};
use crate::model::issue::{TrackedComment, TrackedIssue};
use crate::paths;

const ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("hubmate/", env!("CARGO_PKG_VERSION"));
const READ_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GitHubForge {
    api_base: String,
    repo: String,
    branch: String,
    auth_header: String,
    client: reqwest::Client,
}

impl GitHubForge {
    /// Fails before any network I/O when no token can be resolved.
    pub fn new(config: &HubConfig) -> Result<Self, MissingToken> {
        let token = config.resolve_token()?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            auth_header: format!("token {token}"),
            client: reqwest::Client::new(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            self.repo,
            paths::encode_path(path)
        )
    }

    async fn get(&self, url: &str) -> ApiResult<reqwest::Response> {
        let resp = self
            .client
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
            .timeout(READ_TIMEOUT)
            .send()
            .await?;
        check_status(resp).await
    }
}

#[derive(Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ContentsEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct WriteResponse {
    content: WrittenContent,
}

#[derive(Deserialize)]
struct WrittenContent {
    html_url: String,
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    user: GhUser,
    created_at: DateTime<Utc>,
    html_url: String,
}

#[derive(Deserialize)]
struct GhComment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
    user: GhUser,
    created_at: DateTime<Utc>,
    html_url: String,
}

#[async_trait]
impl Forge for GitHubForge {
    async fn current_user(&self) -> ApiResult<String> {
        let url = format!("{}/user", self.api_base);
        let user: GhUser = self.get(&url).await?.json().await?;
        Ok(user.login)
    }

    async fn repo_accessible(&self) -> ApiResult<()> {
        let url = format!("{}/repos/{}", self.api_base, self.repo);
        self.get(&url).await?;
        Ok(())
    }

    async fn read_file(&self, path: &str) -> ApiResult<Option<RemoteFile>> {
        match self.get(&self.contents_url(path)).await {
            Ok(resp) => {
                let file: ContentsFile = resp.json().await?;
                let text = decode_content(file.content.as_deref().unwrap_or_default())?;
                Ok(Some(RemoteFile {
                    text,
                    sha: file.sha,
                }))
            }
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn write_file(
        &self,
        path: &str,
        text: &str,
        message: &str,
        replace_sha: Option<&str>,
    ) -> ApiResult<String> {
        let mut payload = serde_json::json!({
            "message": message,
            "content": base64::engine::general_purpose::STANDARD.encode(text.as_bytes()),
            "branch": self.branch,
        });
        if let Some(sha) = replace_sha {
            payload["sha"] = serde_json::Value::String(sha.to_string());
        }

        let resp = self
            .client
            .put(self.contents_url(path))
            .header("Authorization", &self.auth_header)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
            .timeout(WRITE_TIMEOUT)
            .json(&payload)
            .send()
            .await?;
        let written: WriteResponse = check_status(resp).await?.json().await?;
        Ok(written.content.html_url)
    }

    async fn list_dir(&self, path: &str) -> ApiResult<Vec<RemoteEntry>> {
        let entries: Vec<ContentsEntry> = self.get(&self.contents_url(path)).await?.json().await?;
        Ok(entries
            .into_iter()
            .map(|e| RemoteEntry {
                is_dir: e.kind == "dir",
                name: e.name,
                download_url: e.download_url,
                html_url: e.html_url,
            })
            .collect())
    }

    async fn fetch_raw(&self, url: &str) -> ApiResult<String> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .timeout(READ_TIMEOUT)
            .send()
            .await?;
        Ok(check_status(resp).await?.text().await?)
    }

    async fn open_issues(&self) -> ApiResult<Vec<TrackedIssue>> {
        let url = format!(
            "{}/repos/{}/issues?state=open&per_page=50",
            self.api_base, self.repo
        );
        let issues: Vec<GhIssue> = self.get(&url).await?.json().await?;
        Ok(issues
            .into_iter()
            .map(|i| TrackedIssue {
                number: i.number,
                title: i.title,
                body: i.body.unwrap_or_default(),
                author: i.user.login,
                created_at: i.created_at,
                url: i.html_url,
            })
            .collect())
    }

    async fn issue_comments(&self, issue_number: u64) -> ApiResult<Vec<TrackedComment>> {
        let url = format!(
            "{}/repos/{}/issues/{issue_number}/comments",
            self.api_base, self.repo
        );
        let comments: Vec<GhComment> = self.get(&url).await?.json().await?;
        Ok(comments
            .into_iter()
            .map(|c| TrackedComment {
                id: c.id,
                issue_number,
                author: c.user.login,
                body: c.body.unwrap_or_default(),
                created_at: c.created_at,
                url: c.html_url,
            })
            .collect())
    }

    async fn post_comment(&self, issue_number: u64, body: &str) -> ApiResult<String> {
        let url = format!(
            "{}/repos/{}/issues/{issue_number}/comments",
            self.api_base, self.repo
        );
        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
            .timeout(WRITE_TIMEOUT)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        let comment: GhComment = check_status(resp).await?.json().await?;
        Ok(comment.html_url)
    }
}

/// Map the response status onto the error taxonomy, pulling the API's
/// `message` field out of the body when there is one.
async fn check_status(resp: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect());
    Err(match status.as_u16() {
        401 => ApiError::Auth("token invalid or expired".to_string()),
        403 => ApiError::Auth("token lacks repo permission".to_string()),
        404 => ApiError::NotFound(message),
        code => ApiError::Status {
            status: code,
            message,
        },
    })
}

/// The contents API returns base64 with embedded newlines; strip whitespace
/// before decoding.
fn decode_content(encoded: &str) -> ApiResult<String> {
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| ApiError::Payload(format!("invalid base64 content: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Payload(format!("content is not UTF-8: {e}")))
}

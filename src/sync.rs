//! Log synchronization flows: push, pull, team view, search, connection
//! test. Batch operations capture per-item failures, log them with their
//! cause, and keep going; only the initial listing aborts a batch.

use tracing::warn;

use crate::forge::{ApiResult, Forge, RemoteEntry};
use crate::frontmatter;
use crate::model::log::{LogDocument, LogFile};
use crate::paths::{self, Team};
use crate::search::{self, SearchHit, SearchQuery};

/// How many of a member's most recent log files a search will scan.
pub const MAX_LOGS_PER_MEMBER: usize = 20;

#[derive(Debug, Clone)]
pub struct PushReceipt {
    pub url: String,
    /// True when an existing log for that date was replaced.
    pub updated: bool,
}

/// Push one day's log, replacing any prior revision via its content SHA.
pub async fn push_log(forge: &dyn Forge, doc: &LogDocument) -> ApiResult<PushReceipt> {
    let path = paths::log_path(&doc.member_id, doc.team, &doc.date);
    let existing = forge.read_file(&path).await?;
    let updated = existing.is_some();

    let text = frontmatter::encode(doc);
    let message = format!("📝 [{}] Sync daily log for {}", doc.member_id, doc.date);
    let url = forge
        .write_file(
            &path,
            &text,
            &message,
            existing.as_ref().map(|f| f.sha.as_str()),
        )
        .await?;

    Ok(PushReceipt { url, updated })
}

/// `Ok(None)` when no log exists for that member and date.
pub async fn pull_log(
    forge: &dyn Forge,
    member_id: &str,
    team: Team,
    date: &str,
) -> ApiResult<Option<String>> {
    let path = paths::log_path(member_id, team, date);
    Ok(forge.read_file(&path).await?.map(|f| f.text))
}

#[derive(Debug, Clone)]
pub struct MemberLog {
    pub member_id: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct TeamLogs {
    pub logs: Vec<MemberLog>,
    /// Member directories found, whether or not they had a log for the date.
    pub members_seen: usize,
}

/// Pull every team member's log for one date. A member whose fetch fails is
/// logged and skipped; the batch never aborts.
pub async fn pull_team(forge: &dyn Forge, team: Team, date: &str) -> ApiResult<TeamLogs> {
    let entries = forge.list_dir(&paths::team_root(team)).await?;
    let members: Vec<String> = entries
        .into_iter()
        .filter(|e| e.is_dir)
        .map(|e| e.name)
        .collect();

    let mut logs = Vec::new();
    for member_id in &members {
        match pull_log(forge, member_id, team, date).await {
            Ok(Some(text)) => logs.push(MemberLog {
                member_id: member_id.clone(),
                text,
            }),
            Ok(None) => {}
            Err(err) => warn!(member = %member_id, %err, "skipping member, log fetch failed"),
        }
    }

    Ok(TeamLogs {
        logs,
        members_seen: members.len(),
    })
}

/// Search the team's recent logs. Scans at most [`MAX_LOGS_PER_MEMBER`]
/// files per member (newest first), filters on the filename date before
/// downloading anything, and stops as soon as the query's limit is reached.
pub async fn search_team(
    forge: &dyn Forge,
    team: Team,
    query: &SearchQuery,
) -> ApiResult<Vec<SearchHit>> {
    let root = paths::team_root(team);
    let entries = forge.list_dir(&root).await?;
    let members = entries
        .into_iter()
        .filter(|e| e.is_dir)
        .filter(|e| query.matches_member(&e.name));

    let mut hits = Vec::new();
    'members: for member in members {
        let member_path = format!("{root}/{}", member.name);
        let files = match forge.list_dir(&member_path).await {
            Ok(files) => files,
            Err(err) => {
                warn!(member = %member.name, %err, "skipping member, listing failed");
                continue;
            }
        };

        let mut log_files: Vec<RemoteEntry> = files
            .into_iter()
            .filter(|f| !f.is_dir && f.name.ends_with("_log.md"))
            .collect();
        log_files.sort_by(|a, b| b.name.cmp(&a.name));

        for file in log_files.into_iter().take(MAX_LOGS_PER_MEMBER) {
            let date = file
                .name
                .strip_suffix("_log.md")
                .unwrap_or(&file.name)
                .to_string();
            if !query.date_in_range(&date) {
                continue;
            }
            let download_url = match &file.download_url {
                Some(url) => url.clone(),
                None => {
                    warn!(member = %member.name, file = %file.name, "skipping file, no download URL");
                    continue;
                }
            };
            let text = match forge.fetch_raw(&download_url).await {
                Ok(text) => text,
                Err(err) => {
                    warn!(member = %member.name, file = %file.name, %err, "skipping file, fetch failed");
                    continue;
                }
            };

            let log = LogFile {
                member_id: member.name.clone(),
                date,
                url: file.html_url.unwrap_or(download_url),
                text,
            };
            if let Some(hit) = search::match_document(&log, query) {
                hits.push(hit);
                if query.limit > 0 && hits.len() >= query.limit {
                    break 'members;
                }
            }
        }
    }

    Ok(hits)
}

/// Token and repo-permission probe. Returns the authenticated login.
pub async fn test_connection(forge: &dyn Forge) -> ApiResult<String> {
    let login = forge.current_user().await?;
    forge.repo_accessible().await?;
    Ok(login)
}

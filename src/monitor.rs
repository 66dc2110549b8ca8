//! Issue-watch flows: snapshot the member's threads, run the diff queries,
//! post replies, and record handled IDs. State is mutated only after a reply
//! actually lands.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use crate::diff::{self, NewQuestion, NewReply};
use crate::forge::{ApiResult, Forge};
use crate::model::issue::{TrackedComment, TrackedIssue};
use crate::state::{StateStore, SyncState};

/// One fetched snapshot of everything addressed to the member.
pub struct MemberThreads {
    pub issues: Vec<TrackedIssue>,
    pub comments_by_issue: HashMap<u64, Vec<TrackedComment>>,
}

/// Fetch open issues addressed to the member plus each issue's comments.
/// A failed comment fetch leaves the issue out of the comment map (it then
/// counts as uncommented) with the cause logged.
pub async fn fetch_member_threads(forge: &dyn Forge, member_id: &str) -> ApiResult<MemberThreads> {
    let issues: Vec<TrackedIssue> = forge
        .open_issues()
        .await?
        .into_iter()
        .filter(|issue| diff::is_addressed_to(issue, member_id))
        .collect();

    let mut comments_by_issue = HashMap::new();
    for issue in &issues {
        match forge.issue_comments(issue.number).await {
            Ok(comments) => {
                comments_by_issue.insert(issue.number, comments);
            }
            Err(err) => {
                warn!(issue = issue.number, %err, "comment fetch failed, treating issue as uncommented");
            }
        }
    }

    Ok(MemberThreads {
        issues,
        comments_by_issue,
    })
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub new_questions: Vec<NewQuestion>,
    pub new_replies: Vec<NewReply>,
}

impl CheckReport {
    pub fn is_empty(&self) -> bool {
        self.new_questions.is_empty() && self.new_replies.is_empty()
    }
}

/// Run both diff queries over a single fetched snapshot.
pub async fn check(forge: &dyn Forge, member_id: &str, state: &SyncState) -> ApiResult<CheckReport> {
    let threads = fetch_member_threads(forge, member_id).await?;
    Ok(CheckReport {
        new_questions: diff::find_new_questions(
            member_id,
            &threads.issues,
            &threads.comments_by_issue,
            state,
        ),
        new_replies: diff::find_new_replies(
            member_id,
            &threads.issues,
            &threads.comments_by_issue,
            state,
        ),
    })
}

/// Post a reply, then mark the issue handled. The mark happens only after a
/// successful post, so a failed reply keeps the issue in the next report.
pub async fn reply_to_issue(
    forge: &dyn Forge,
    store: &mut StateStore,
    issue_number: u64,
    body: &str,
) -> Result<String> {
    let url = forge.post_comment(issue_number, body).await?;
    store
        .mark_issue_replied(issue_number)
        .with_context(|| format!("reply to #{issue_number} posted, but marking it failed"))?;
    Ok(url)
}

/// Record a reply comment as handled without posting anything.
pub fn ack_comment(store: &mut StateStore, comment_id: u64) -> Result<()> {
    store.mark_comment_replied(comment_id)
}

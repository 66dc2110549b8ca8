//! Pure queries that decide what is "new" in a member's issue threads,
//! given a full snapshot from the forge and the persisted sync state.
//! Neither function performs I/O or mutates state; handled IDs are recorded
//! separately, after a reply is actually sent.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::model::issue::{TrackedComment, TrackedIssue};
use crate::state::SyncState;

/// Heuristic "is this issue for me" filter: the member id appears
/// case-insensitively in the title, or as a literal `@member` mention in the
/// body. May both over- and under-match; exactness is not the contract.
pub fn is_addressed_to(issue: &TrackedIssue, member_id: &str) -> bool {
    let needle = member_id.to_lowercase();
    issue.title.to_lowercase().contains(&needle)
        || issue.body.contains(&format!("@{member_id}"))
}

/// An issue nobody has answered yet.
#[derive(Debug, Clone, Serialize)]
pub struct NewQuestion {
    pub issue_number: u64,
    pub title: String,
    pub body: String,
    pub author: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Someone else commented after the member's latest comment on an issue.
#[derive(Debug, Clone, Serialize)]
pub struct NewReply {
    pub issue_number: u64,
    pub issue_title: String,
    pub comment_id: u64,
    pub author: String,
    pub body: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// An issue is a new question iff its number has not been marked replied and
/// the member has never commented on it. At-most-once: a single comment by
/// the member settles the issue regardless of later questions, unless it is
/// explicitly re-marked.
pub fn find_new_questions(
    member_id: &str,
    issues: &[TrackedIssue],
    comments_by_issue: &HashMap<u64, Vec<TrackedComment>>,
    state: &SyncState,
) -> Vec<NewQuestion> {
    issues
        .iter()
        .filter(|issue| !state.replied_issues.contains(&issue.number))
        .filter(|issue| {
            comments_by_issue
                .get(&issue.number)
                .map_or(true, |comments| {
                    !comments.iter().any(|c| c.author == member_id)
                })
        })
        .map(|issue| NewQuestion {
            issue_number: issue.number,
            title: issue.title.clone(),
            body: issue.body.clone(),
            author: issue.author.clone(),
            url: issue.url.clone(),
            created_at: issue.created_at,
        })
        .collect()
}

/// For each issue where the member has commented, report comments by other
/// authors created strictly after the member's latest comment and not yet
/// marked handled. Equal timestamps are not "after": the strict comparison
/// is deliberate and preserved.
pub fn find_new_replies(
    member_id: &str,
    issues: &[TrackedIssue],
    comments_by_issue: &HashMap<u64, Vec<TrackedComment>>,
    state: &SyncState,
) -> Vec<NewReply> {
    let mut replies = Vec::new();

    for issue in issues {
        let comments = match comments_by_issue.get(&issue.number) {
            Some(comments) => comments,
            None => continue,
        };
        let last_own = comments
            .iter()
            .filter(|c| c.author == member_id)
            .map(|c| c.created_at)
            .max();
        let last_own = match last_own {
            Some(t) => t,
            None => continue,
        };

        for comment in comments {
            if comment.author != member_id
                && comment.created_at > last_own
                && !state.replied_comments.contains(&comment.id)
            {
                replies.push(NewReply {
                    issue_number: issue.number,
                    issue_title: issue.title.clone(),
                    comment_id: comment.id,
                    author: comment.author.clone(),
                    body: comment.body.clone(),
                    url: comment.url.clone(),
                    created_at: comment.created_at,
                });
            }
        }
    }

    replies
}

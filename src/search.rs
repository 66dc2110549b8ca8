//! Keyword/project/date search over fetched log documents. The matcher is a
//! pure function per document; the driver stops as soon as the result limit
//! is reached, so result order is enumeration order, not relevance.

use serde::Serialize;

use crate::frontmatter::{self, FrontMatter};
use crate::model::log::LogFile;

/// Hard cap on the length of any excerpt.
pub const EXCERPT_MAX_CHARS: usize = 300;

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub project: Option<String>,
    pub member: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Maximum number of hits; 0 means uncapped.
    pub limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            project: None,
            member: None,
            date_from: None,
            date_to: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchQuery {
    pub fn matches_member(&self, member_id: &str) -> bool {
        match &self.member {
            Some(m) => member_id.to_lowercase().contains(&m.to_lowercase()),
            None => true,
        }
    }

    /// Lexicographic range check, valid because dates are zero-padded ISO
    /// strings.
    pub fn date_in_range(&self, date: &str) -> bool {
        if let Some(from) = &self.date_from {
            if date < from.as_str() {
                return false;
            }
        }
        if let Some(to) = &self.date_to {
            if date > to.as_str() {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Project,
    Keyword,
    All,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Project => "project",
            MatchKind::Keyword => "keyword",
            MatchKind::All => "all",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub member_id: String,
    /// From the document's front matter, falling back to the member id.
    pub member_name: String,
    pub date: String,
    pub match_type: MatchKind,
    pub excerpt: String,
    pub url: String,
    pub front_matter: FrontMatter,
}

/// Apply the query to one document. Member and date filters run first; then
/// the first satisfied rule wins: project match against decoded front-matter
/// values, keyword match against the raw text, or — when neither filter is
/// given — an unconditional "all" match.
pub fn match_document(file: &LogFile, query: &SearchQuery) -> Option<SearchHit> {
    if !query.matches_member(&file.member_id) || !query.date_in_range(&file.date) {
        return None;
    }

    let front_matter = frontmatter::decode(&file.text);

    let (match_type, excerpt) = match (query.project.as_deref(), query.keyword.as_deref()) {
        (Some(project), keyword) => {
            if front_matter.values().any(|v| v.contains_ci(project)) {
                (MatchKind::Project, format!("project: {project}"))
            } else {
                (MatchKind::Keyword, keyword_excerpt(&file.text, keyword?)?)
            }
        }
        (None, Some(keyword)) => (MatchKind::Keyword, keyword_excerpt(&file.text, keyword)?),
        (None, None) => {
            let excerpt = front_matter
                .get("ai_learning")
                .filter(|v| !v.is_empty())
                .map(|v| v.render())
                .unwrap_or_default();
            (MatchKind::All, excerpt)
        }
    };

    let member_name = front_matter
        .get("member_name")
        .and_then(|v| v.as_scalar())
        .unwrap_or(&file.member_id)
        .to_string();

    Some(SearchHit {
        member_id: file.member_id.clone(),
        member_name,
        date: file.date.clone(),
        match_type,
        excerpt: truncate(&excerpt),
        url: file.url.clone(),
        front_matter,
    })
}

/// Scan documents in order, stopping once the limit is reached.
pub fn search_logs<'a>(
    documents: impl IntoIterator<Item = &'a LogFile>,
    query: &SearchQuery,
) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for document in documents {
        if let Some(hit) = match_document(document, query) {
            hits.push(hit);
            if query.limit > 0 && hits.len() >= query.limit {
                break;
            }
        }
    }
    hits
}

/// Two lines of context either side of the first line containing the
/// keyword, clipped at document boundaries. None when the keyword does not
/// appear at all.
fn keyword_excerpt(text: &str, keyword: &str) -> Option<String> {
    let needle = keyword.to_lowercase();
    let lines: Vec<&str> = text.lines().collect();
    let hit = lines
        .iter()
        .position(|line| line.to_lowercase().contains(&needle))?;
    let start = hit.saturating_sub(2);
    let end = (hit + 3).min(lines.len());
    Some(lines[start..end].join("\n"))
}

fn truncate(excerpt: &str) -> String {
    excerpt.chars().take(EXCERPT_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::encode;
    use crate::model::log::{AiLearning, LogDocument, StructuredUpdate, Task};
    use crate::paths::Team;

    fn log_file(member_id: &str, date: &str, text: &str) -> LogFile {
        LogFile {
            member_id: member_id.to_string(),
            date: date.to_string(),
            url: format!("https://example.test/{member_id}/{date}"),
            text: text.to_string(),
        }
    }

    fn encoded_log(member_id: &str, date: &str, body: &str, project: Option<&str>) -> LogFile {
        let structured = project.map(|p| StructuredUpdate {
            done: vec![Task {
                content: "task".to_string(),
                project: Some(p.to_string()),
                blockers: Vec::new(),
            }],
            ..StructuredUpdate::default()
        });
        let doc = LogDocument::new(member_id, "Alice Zhang", Team::China, date, body, structured);
        log_file(member_id, date, &encode(&doc))
    }

    #[test]
    fn no_filters_matches_everything() {
        let docs = vec![
            encoded_log("alice", "2024-05-01", "body one", None),
            encoded_log("alice", "2024-05-02", "body two", None),
        ];
        let hits = search_logs(&docs, &SearchQuery::default());
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.match_type == MatchKind::All));
    }

    #[test]
    fn all_match_excerpt_is_empty_without_ai_learning() {
        let docs = vec![encoded_log("alice", "2024-05-01", "body", None)];
        let hits = search_logs(&docs, &SearchQuery::default());
        assert_eq!(hits[0].excerpt, "");
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let docs: Vec<LogFile> = (1..=5)
            .map(|d| encoded_log("alice", &format!("2024-05-0{d}"), "body", None))
            .collect();
        let query = SearchQuery {
            date_from: Some("2024-05-02".to_string()),
            date_to: Some("2024-05-04".to_string()),
            ..SearchQuery::default()
        };
        let hits = search_logs(&docs, &query);
        let dates: Vec<&str> = hits.iter().map(|h| h.date.as_str()).collect();
        assert_eq!(dates, ["2024-05-02", "2024-05-03", "2024-05-04"]);
    }

    #[test]
    fn keyword_matches_case_insensitively_with_context() {
        let text = "line 1\nline 2\nthe Parser landed today\nline 4\nline 5\nline 6";
        let docs = vec![log_file("alice", "2024-05-01", text)];
        let query = SearchQuery {
            keyword: Some("parser".to_string()),
            ..SearchQuery::default()
        };
        let hits = search_logs(&docs, &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].match_type, MatchKind::Keyword);
        assert_eq!(
            hits[0].excerpt,
            "line 1\nline 2\nthe Parser landed today\nline 4\nline 5"
        );
    }

    #[test]
    fn keyword_context_clips_at_document_start() {
        let text = "the parser landed\nline 2";
        let docs = vec![log_file("alice", "2024-05-01", text)];
        let query = SearchQuery {
            keyword: Some("parser".to_string()),
            ..SearchQuery::default()
        };
        let hits = search_logs(&docs, &query);
        assert_eq!(hits[0].excerpt, "the parser landed\nline 2");
    }

    #[test]
    fn keyword_miss_yields_no_hit() {
        let docs = vec![log_file("alice", "2024-05-01", "nothing relevant")];
        let query = SearchQuery {
            keyword: Some("parser".to_string()),
            ..SearchQuery::default()
        };
        assert!(search_logs(&docs, &query).is_empty());
    }

    #[test]
    fn project_match_scans_front_matter_values() {
        let docs = vec![encoded_log("alice", "2024-05-01", "body", Some("ai-tutor"))];
        let query = SearchQuery {
            project: Some("AI-Tutor".to_string()),
            ..SearchQuery::default()
        };
        let hits = search_logs(&docs, &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].match_type, MatchKind::Project);
        assert_eq!(hits[0].excerpt, "project: AI-Tutor");
    }

    #[test]
    fn project_rule_wins_over_keyword_when_both_match() {
        let docs = vec![encoded_log(
            "alice",
            "2024-05-01",
            "worked on ai-tutor today",
            Some("ai-tutor"),
        )];
        let query = SearchQuery {
            project: Some("ai-tutor".to_string()),
            keyword: Some("today".to_string()),
            ..SearchQuery::default()
        };
        let hits = search_logs(&docs, &query);
        assert_eq!(hits[0].match_type, MatchKind::Project);
    }

    #[test]
    fn keyword_still_applies_when_project_misses() {
        let docs = vec![encoded_log("alice", "2024-05-01", "shipped the cache", None)];
        let query = SearchQuery {
            project: Some("no-such-project".to_string()),
            keyword: Some("cache".to_string()),
            ..SearchQuery::default()
        };
        let hits = search_logs(&docs, &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].match_type, MatchKind::Keyword);
    }

    #[test]
    fn member_filter_is_substring_case_insensitive() {
        let docs = vec![
            encoded_log("alice-zh", "2024-05-01", "body", None),
            encoded_log("bob", "2024-05-01", "body", None),
        ];
        let query = SearchQuery {
            member: Some("ALICE".to_string()),
            ..SearchQuery::default()
        };
        let hits = search_logs(&docs, &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].member_id, "alice-zh");
    }

    #[test]
    fn member_name_comes_from_front_matter() {
        let docs = vec![encoded_log("alice", "2024-05-01", "body", None)];
        let hits = search_logs(&docs, &SearchQuery::default());
        assert_eq!(hits[0].member_name, "Alice Zhang");

        let raw = vec![log_file("bob", "2024-05-01", "no front matter here")];
        let hits = search_logs(&raw, &SearchQuery::default());
        assert_eq!(hits[0].member_name, "bob");
    }

    #[test]
    fn limit_short_circuits_the_scan() {
        let docs: Vec<LogFile> = (0..30)
            .map(|i| encoded_log("alice", &format!("2024-04-{:02}", i % 28 + 1), "body", None))
            .collect();
        let query = SearchQuery {
            limit: 3,
            ..SearchQuery::default()
        };
        assert_eq!(search_logs(&docs, &query).len(), 3);

        let uncapped = SearchQuery {
            limit: 0,
            ..SearchQuery::default()
        };
        assert_eq!(search_logs(&docs, &uncapped).len(), 30);
    }

    #[test]
    fn excerpt_is_capped_at_300_chars() {
        let long_line = format!("parser {}", "x".repeat(500));
        let docs = vec![log_file("alice", "2024-05-01", &long_line)];
        let query = SearchQuery {
            keyword: Some("parser".to_string()),
            ..SearchQuery::default()
        };
        let hits = search_logs(&docs, &query);
        assert_eq!(hits[0].excerpt.chars().count(), EXCERPT_MAX_CHARS);
    }

    #[test]
    fn all_match_excerpt_uses_decoded_ai_learning() {
        // The nested ai_learning block decodes as an empty list, so encoded
        // documents fall back to an empty excerpt; a flat scalar shows up.
        let structured = StructuredUpdate {
            ai_learning: Some(AiLearning {
                topic: Some("prompts".to_string()),
                insight: None,
                applied_to: None,
            }),
            ..StructuredUpdate::default()
        };
        let doc = LogDocument::new("alice", "Alice", Team::China, "2024-05-01", "b", Some(structured));
        let docs = vec![log_file("alice", "2024-05-01", &encode(&doc))];
        let hits = search_logs(&docs, &SearchQuery::default());
        assert_eq!(hits[0].excerpt, "");

        let flat = "---\nmember_id: alice\nai_learning: shorter prompts win\n---\nbody";
        let docs = vec![log_file("alice", "2024-05-01", flat)];
        let hits = search_logs(&docs, &SearchQuery::default());
        assert_eq!(hits[0].excerpt, "shorter prompts win");
    }
}

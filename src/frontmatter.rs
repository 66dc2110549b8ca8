use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::log::LogDocument;

/// Marker line opening and closing the metadata block.
pub const FM_MARKER: &str = "---";

const STRUCTURED_HEADER: &str = "# === A2A Structured Data ===";
const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// A decoded front-matter value: either a scalar line or the items of a
/// `key:` block written as `  - item` lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FmValue {
    Scalar(String),
    List(Vec<String>),
}

impl FmValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FmValue::Scalar(s) => Some(s),
            FmValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FmValue::Scalar(_) => None,
            FmValue::List(items) => Some(items),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FmValue::Scalar(s) => s.is_empty(),
            FmValue::List(items) => items.is_empty(),
        }
    }

    /// Case-insensitive substring check across the scalar or every list item.
    pub fn contains_ci(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        match self {
            FmValue::Scalar(s) => s.to_lowercase().contains(&needle),
            FmValue::List(items) => items.iter().any(|i| i.to_lowercase().contains(&needle)),
        }
    }

    /// Flatten to display text (list items joined with "; ").
    pub fn render(&self) -> String {
        match self {
            FmValue::Scalar(s) => s.clone(),
            FmValue::List(items) => items.join("; "),
        }
    }
}

pub type FrontMatter = BTreeMap<String, FmValue>;

/// Render a full log document: front-matter block, title line, framed body,
/// synced-at footer. The structured task lists are written for human and
/// agent readability; only scalar lines and plain `  - item` lists are
/// expected to survive a [`decode`] round trip.
pub fn encode(doc: &LogDocument) -> String {
    let mut lines: Vec<String> = vec![
        FM_MARKER.to_string(),
        format!("member_id: {}", doc.member_id),
        format!("member_name: {}", doc.member_name),
        format!("date: {}", doc.date),
        format!("synced_at: {}", doc.synced_at),
        format!("team: {}", doc.team),
        format!("source: {}", doc.source),
    ];

    if doc.has_structured_data() {
        lines.push(String::new());
        lines.push(STRUCTURED_HEADER.to_string());

        if !doc.tasks_done.is_empty() {
            lines.push("tasks_done:".to_string());
            for task in &doc.tasks_done {
                lines.push(format!("  - content: \"{}\"", task.content));
                if let Some(project) = task.project.as_deref().filter(|p| !p.is_empty()) {
                    lines.push(format!("    project: {project}"));
                }
            }
        }

        if !doc.tasks_in_progress.is_empty() {
            lines.push("tasks_in_progress:".to_string());
            for task in &doc.tasks_in_progress {
                lines.push(format!("  - content: \"{}\"", task.content));
                if !task.blockers.is_empty() {
                    lines.push(format!("    blockers: [{}]", task.blockers.join(", ")));
                }
            }
        }

        if !doc.tasks_tomorrow.is_empty() {
            lines.push("tasks_tomorrow:".to_string());
            for task in &doc.tasks_tomorrow {
                lines.push(format!("  - content: \"{}\"", task.content));
            }
        }

        if let Some(learning) = &doc.ai_learning {
            lines.push("ai_learning:".to_string());
            if let Some(topic) = &learning.topic {
                lines.push(format!("  topic: \"{topic}\""));
            }
            if let Some(insight) = &learning.insight {
                lines.push(format!("  insight: \"{insight}\""));
            }
            if let Some(applied_to) = &learning.applied_to {
                lines.push(format!("  applied_to: \"{applied_to}\""));
            }
        }

        // Aggregated blockers, written in the decode-supported list shape so
        // other agents can scrape them back out.
        if doc.blockers.is_empty() {
            lines.push("blockers: []".to_string());
        } else {
            lines.push("blockers:".to_string());
            for blocker in &doc.blockers {
                lines.push(format!("  - {blocker}"));
            }
        }
    }

    lines.push(FM_MARKER.to_string());
    let front_matter = lines.join("\n");

    format!(
        "{front_matter}\n\n# {} | {}\n\n{RULE}\n\n{}\n\n{RULE}\n\n_synced at {}_\n",
        doc.member_name,
        long_date(&doc.date),
        doc.body,
        clock_time(&doc.synced_at),
    )
}

/// Best-effort front-matter scraper. Recognizes top-level `key: value` lines
/// and `  - item` lines under a key whose value is empty; everything else is
/// ignored. Never fails: the worst case is an empty map.
pub fn decode(text: &str) -> FrontMatter {
    let mut data = FrontMatter::new();
    if !text.starts_with(FM_MARKER) {
        return data;
    }

    let mut parts = text.splitn(3, FM_MARKER);
    parts.next(); // the empty prefix before the opening marker
    let block = match (parts.next(), parts.next()) {
        (Some(block), Some(_)) => block,
        _ => return data,
    };

    // The most recently opened list key. Deliberately left open across
    // intervening scalar keys and unrecognized lines, matching the trailing
    // sub-field lines that task blocks interleave with their items.
    let mut open_list: Option<String> = None;

    for raw in block.trim().lines() {
        let line = raw.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if !line.starts_with(' ') && line.contains(':') {
            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim();
                let value = value.trim();
                if value.is_empty() {
                    data.insert(key.to_string(), FmValue::List(Vec::new()));
                    open_list = Some(key.to_string());
                } else {
                    let value = value.trim_matches(|c| c == '"' || c == '\'');
                    data.insert(key.to_string(), FmValue::Scalar(value.to_string()));
                }
            }
        } else if let Some(item) = line.strip_prefix("  - ") {
            if let Some(key) = &open_list {
                if let Some(FmValue::List(items)) = data.get_mut(key) {
                    items.push(item.trim().to_string());
                }
            }
        }
    }

    data
}

/// `YYYY-MM-DD` → `YYYY.MM.DD Www`. A date that does not parse falls back to
/// the raw input with the weekday omitted.
fn long_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => format!("{} {}", d.format("%Y.%m.%d"), d.format("%a")),
        Err(_) => date.to_string(),
    }
}

/// HH:MM portion of an RFC 3339-style timestamp, empty if the string is too
/// short or oddly shaped.
fn clock_time(synced_at: &str) -> &str {
    synced_at.get(11..16).unwrap_or("")
}

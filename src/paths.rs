use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Top-level directory in the hub repo that holds all member logs.
pub const MEMBERS_ROOT: &str = "成员日志 members";

/// The fixed set of teams the hub repository is organized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    China,
    MiddleEast,
    BestAllies,
}

#[derive(Debug, Error)]
#[error("invalid team '{0}' (expected one of: china, middle_east, best_allies)")]
pub struct InvalidTeam(pub String);

impl Team {
    pub const ALL: [Team; 3] = [Team::China, Team::MiddleEast, Team::BestAllies];

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::China => "china",
            Team::MiddleEast => "middle_east",
            Team::BestAllies => "best_allies",
        }
    }

    /// Directory name under [`MEMBERS_ROOT`] in the hub repo. These mix a
    /// Chinese label with an ASCII slug; they are repository data, not UI text.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Team::China => "中国团队 china-team",
            Team::MiddleEast => "中东团队 middle-east",
            Team::BestAllies => "最佳外援 best-allies",
        }
    }
}

impl FromStr for Team {
    type Err = InvalidTeam;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Team::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| InvalidTeam(s.to_string()))
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repo-relative directory holding one team's member directories.
pub fn team_root(team: Team) -> String {
    format!("{MEMBERS_ROOT}/{}", team.dir_name())
}

/// Repo-relative path of one member's daily log. Pure and deterministic:
/// the same (member, team, date) always maps to the same path.
pub fn log_path(member_id: &str, team: Team, date: &str) -> String {
    format!("{}/{member_id}/{date}_log.md", team_root(team))
}

/// Percent-encode each path segment for the contents API, leaving the
/// slashes alone. The team directories contain CJK characters and spaces,
/// which GitHub rejects unencoded.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

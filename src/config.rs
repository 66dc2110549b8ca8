use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variables consulted for the API token, in priority order,
/// when the config file does not carry one.
pub const TOKEN_ENV_VARS: [&str; 3] = ["GITHUB_PAT_TEAM_HUB", "GITHUB_TOKEN", "GH_TOKEN"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// owner/name of the hub repository all commands target.
    pub repo: String,
    pub api_base: String,
    pub branch: String,
    /// Identity whose logs and issue threads this tooling manages.
    pub member_id: String,
    pub member_name: String,
    pub team: String,
    /// Explicit token. Takes priority over the environment.
    pub token: Option<String>,
    /// Override for the issue-state file location.
    pub state_file: Option<PathBuf>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            repo: "AIEC-Team/AIEC-agent-hub".to_string(),
            api_base: "https://api.github.com".to_string(),
            branch: "main".to_string(),
            member_id: "kkkaka-oss".to_string(),
            member_name: "Jiahe Gong".to_string(),
            team: "china".to_string(),
            token: None,
            state_file: None,
        }
    }
}

#[derive(Debug, Error)]
#[error(
    "no API token found; set `token` in ~/.hubmate/config.toml or export one of \
     GITHUB_PAT_TEAM_HUB, GITHUB_TOKEN, GH_TOKEN"
)]
pub struct MissingToken;

impl HubConfig {
    /// Resolve the token: explicit config value first, then the environment.
    /// A missing token is a fatal configuration error, surfaced before any
    /// network call is made.
    pub fn resolve_token(&self) -> Result<String, MissingToken> {
        if let Some(token) = &self.token {
            if !token.is_empty() {
                return Ok(token.clone());
            }
        }
        for var in TOKEN_ENV_VARS {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    return Ok(value);
                }
            }
        }
        Err(MissingToken)
    }

    /// Where the issue-monitor state lives.
    pub fn state_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| data_dir().join("issue_state.json"))
    }
}

fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hubmate")
}

pub fn load_config() -> Result<HubConfig> {
    let path = config_path();
    if !path.exists() {
        return Ok(HubConfig::default());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: HubConfig =
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_hub_repo() {
        let cfg = HubConfig::default();
        assert_eq!(cfg.repo, "AIEC-Team/AIEC-agent-hub");
        assert_eq!(cfg.branch, "main");
        assert_eq!(cfg.team, "china");
        assert!(cfg.token.is_none());
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let cfg: HubConfig = toml::from_str("member_id = \"alice\"").unwrap();
        assert_eq!(cfg.member_id, "alice");
        assert_eq!(cfg.repo, "AIEC-Team/AIEC-agent-hub");
        assert_eq!(cfg.api_base, "https://api.github.com");
    }

    #[test]
    fn explicit_token_wins() {
        let cfg = HubConfig {
            token: Some("ghp_explicit".to_string()),
            ..HubConfig::default()
        };
        assert_eq!(cfg.resolve_token().unwrap(), "ghp_explicit");
    }

    #[test]
    fn empty_explicit_token_is_ignored() {
        let cfg = HubConfig {
            token: Some(String::new()),
            ..HubConfig::default()
        };
        // Falls through to the environment; with none of the variables set
        // this is the fatal configuration error.
        if TOKEN_ENV_VARS.iter().all(|v| std::env::var(v).is_err()) {
            assert!(cfg.resolve_token().is_err());
        }
    }

    #[test]
    fn state_path_override_is_honored() {
        let cfg = HubConfig {
            state_file: Some(PathBuf::from("/tmp/custom_state.json")),
            ..HubConfig::default()
        };
        assert_eq!(cfg.state_path(), PathBuf::from("/tmp/custom_state.json"));
    }
}

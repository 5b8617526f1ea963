//! Process-wide configuration.
//!
//! Settings are layered: `luigi.toml` (optional) → environment (including a
//! `.env` file loaded by the binary) → CLI flags. The result is a single
//! [`Config`] value built once at start-up and shared by reference; nothing
//! else in the crate reads the environment.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [repos]
//! dir = "repos"
//!
//! [agent]
//! claude_cmd = "claude"
//! codex_cmd = "codex"
//! git_cmd = "git"
//! interactive_timeout_secs = 300
//! ticket_timeout_secs = 600
//! analysis_timeout_secs = 900
//! clone_timeout_secs = 600
//!
//! [jira]
//! base_url = "https://example.atlassian.net"
//! email = "me@example.com"
//! request_timeout_secs = 10
//! ```
//!
//! Secrets (`JIRA_API_TOKEN`, `GITHUB_TOKEN`, `GITLAB_TOKEN`,
//! `BITBUCKET_APP_PASSWORD`) are only read from the environment.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "luigi.toml";

/// Raw `luigi.toml` contents. Every value is optional so that the
/// environment and defaults can fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LuigiToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub repos: ReposSection,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub jira: JiraSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReposSection {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSection {
    pub claude_cmd: Option<String>,
    pub codex_cmd: Option<String>,
    pub git_cmd: Option<String>,
    pub interactive_timeout_secs: Option<u64>,
    pub ticket_timeout_secs: Option<u64>,
    pub analysis_timeout_secs: Option<u64>,
    pub clone_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JiraSection {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl LuigiToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse luigi.toml")
    }
}

/// Credentials for the issue tracker's REST API.
#[derive(Clone)]
pub struct JiraCredentials {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

impl std::fmt::Debug for JiraCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraCredentials")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct JiraSettings {
    /// `None` when any of base URL, user or token is missing.
    pub credentials: Option<JiraCredentials>,
    pub request_timeout: Duration,
}

/// Tokens injected into clone URLs, keyed by git host.
#[derive(Clone, Default)]
pub struct GitCredentials {
    pub github_token: Option<String>,
    pub gitlab_token: Option<String>,
    pub bitbucket_username: Option<String>,
    pub bitbucket_app_password: Option<String>,
}

impl std::fmt::Debug for GitCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("GitCredentials")
            .field("github_token", &mask(&self.github_token))
            .field("gitlab_token", &mask(&self.gitlab_token))
            .field("bitbucket_username", &self.bitbucket_username)
            .field("bitbucket_app_password", &mask(&self.bitbucket_app_password))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub claude_cmd: String,
    pub codex_cmd: String,
    pub git_cmd: String,
    /// `/codex` and `/claude-code` runs.
    pub interactive_timeout: Duration,
    /// `/jira/execute` runs.
    pub ticket_timeout: Duration,
    /// `luigi.md` generation runs.
    pub analysis_timeout: Duration,
    pub clone_timeout: Duration,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub dev_mode: bool,
    /// Repository store: one sub-directory per cloned repository.
    pub repos_dir: PathBuf,
    /// Working directory for ticket runs that name no repository.
    pub workdir: PathBuf,
    pub agent: AgentSettings,
    pub jira: JiraSettings,
    pub git: GitCredentials,
}

impl Config {
    /// Load from `config_path` (or `./luigi.toml` when present) and the
    /// process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let toml = match config_path {
            Some(path) => LuigiToml::load(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    LuigiToml::load(default_path)?
                } else {
                    LuigiToml::default()
                }
            }
        };
        let workdir = std::env::current_dir().context("Failed to get current directory")?;
        Self::resolve(toml, |key| std::env::var(key).ok(), workdir)
    }

    /// Merge file settings with an environment lookup. `env` returns `None`
    /// for unset variables; empty values count as unset.
    pub fn resolve<F>(toml: LuigiToml, env: F, workdir: PathBuf) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let first_var = |keys: &[&str]| keys.iter().find_map(|key| var(*key));
        let secs = |key: &str, file: Option<u64>, default: u64| -> Result<Duration> {
            let value = match var(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid {}: '{}'", key, raw))?,
                None => file.unwrap_or(default),
            };
            Ok(Duration::from_secs(value))
        };

        let port = match var("LUIGI_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid LUIGI_PORT: '{}'", raw))?,
            None => toml.server.port.unwrap_or(8000),
        };

        let repos_dir = var("LUIGI_REPOS_DIR")
            .map(PathBuf::from)
            .or(toml.repos.dir)
            .unwrap_or_else(|| PathBuf::from("repos"));
        let repos_dir = if repos_dir.is_absolute() {
            repos_dir
        } else {
            workdir.join(repos_dir)
        };

        let agent = AgentSettings {
            claude_cmd: var("CLAUDE_CMD")
                .or(toml.agent.claude_cmd)
                .unwrap_or_else(|| "claude".to_string()),
            codex_cmd: var("CODEX_CMD")
                .or(toml.agent.codex_cmd)
                .unwrap_or_else(|| "codex".to_string()),
            git_cmd: var("GIT_CMD")
                .or(toml.agent.git_cmd)
                .unwrap_or_else(|| "git".to_string()),
            interactive_timeout: secs(
                "LUIGI_INTERACTIVE_TIMEOUT_SECS",
                toml.agent.interactive_timeout_secs,
                300,
            )?,
            ticket_timeout: secs(
                "LUIGI_TICKET_TIMEOUT_SECS",
                toml.agent.ticket_timeout_secs,
                600,
            )?,
            analysis_timeout: secs(
                "LUIGI_ANALYSIS_TIMEOUT_SECS",
                toml.agent.analysis_timeout_secs,
                900,
            )?,
            clone_timeout: secs(
                "LUIGI_CLONE_TIMEOUT_SECS",
                toml.agent.clone_timeout_secs,
                600,
            )?,
        };

        let base_url = first_var(&["JIRA_BASE_URL", "JIRA_URL"]).or(toml.jira.base_url);
        let email = first_var(&["JIRA_EMAIL", "JIRA_USERNAME"]).or(toml.jira.email);
        let api_token = var("JIRA_API_TOKEN");
        let credentials = match (base_url, email, api_token) {
            (Some(base_url), Some(email), Some(api_token)) => Some(JiraCredentials {
                base_url,
                email,
                api_token,
            }),
            _ => None,
        };
        let jira = JiraSettings {
            credentials,
            request_timeout: secs(
                "JIRA_REQUEST_TIMEOUT_SECS",
                toml.jira.request_timeout_secs,
                10,
            )?,
        };

        let git = GitCredentials {
            github_token: var("GITHUB_TOKEN"),
            gitlab_token: var("GITLAB_TOKEN"),
            bitbucket_username: var("BITBUCKET_USERNAME"),
            bitbucket_app_password: var("BITBUCKET_APP_PASSWORD"),
        };

        Ok(Self {
            host: var("LUIGI_HOST")
                .or(toml.server.host)
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            dev_mode: false,
            repos_dir,
            workdir,
            agent,
            jira,
            git,
        })
    }

    /// Create the repository store if it does not exist yet.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.repos_dir).with_context(|| {
            format!(
                "Failed to create repository directory {}",
                self.repos_dir.display()
            )
        })
    }
}

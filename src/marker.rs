//! Repository batch orchestration: make sure every repository carries a
//! `luigi.md` navigation guide.
//!
//! Per repository the flow is
//! `resolve → prepare submodules → marker present? → invoke agent → verify`.
//! The file's existence is the only state; once written it is never
//! regenerated. A sweep over the whole store visits repositories one at a
//! time and turns per-repository failures into result entries.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::agent::prompts::build_marker_prompt;
use crate::agent::{AgentInvocation, AgentKind, AgentRunner};
use crate::config::AgentSettings;
use crate::errors::ServiceError;
use crate::repo::{RepoStore, prepare_submodules};

/// Marker file written at the root of each repository.
pub const MARKER_FILE: &str = "luigi.md";

/// Terminal state of one repository within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    AlreadyExists,
    Confirmed,
    VerificationFailed,
    AgentFailed,
    TimedOut,
    NotFound,
}

impl MarkerState {
    fn from_error(err: &ServiceError) -> Self {
        match err {
            // Unusable names (e.g. a stray " padded" directory) cannot be resolved.
            ServiceError::NotFound(_) | ServiceError::Validation(_) => MarkerState::NotFound,
            ServiceError::Timeout(_) => MarkerState::TimedOut,
            ServiceError::VerificationFailed(_) => MarkerState::VerificationFailed,
            _ => MarkerState::AgentFailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    AlreadyExists,
    Error,
}

/// Successful outcome for a single repository.
#[derive(Debug, Clone, Serialize)]
pub struct MarkerOutcome {
    pub repo: String,
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl MarkerOutcome {
    pub fn state(&self) -> MarkerState {
        match self.status {
            OutcomeStatus::AlreadyExists => MarkerState::AlreadyExists,
            _ => MarkerState::Confirmed,
        }
    }
}

/// One entry of a sweep: the outcome, or the error that stopped this repository.
#[derive(Debug, Clone, Serialize)]
pub struct RepoBatchResult {
    pub repo: String,
    pub status: OutcomeStatus,
    pub state: MarkerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl RepoBatchResult {
    fn from_result(repo: &str, result: Result<MarkerOutcome, ServiceError>) -> Self {
        match result {
            Ok(outcome) => Self {
                state: outcome.state(),
                repo: outcome.repo,
                status: outcome.status,
                message: Some(outcome.message),
                error: None,
                output: outcome.output,
            },
            Err(err) => Self {
                repo: repo.to_string(),
                status: OutcomeStatus::Error,
                state: MarkerState::from_error(&err),
                message: None,
                error: Some(err.to_string()),
                output: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub results: Vec<RepoBatchResult>,
}

/// Result of `ensure_marker_for`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Single(MarkerOutcome),
    Sweep(SweepReport),
}

impl BatchOutcome {
    fn completed(results: Vec<RepoBatchResult>) -> Self {
        BatchOutcome::Sweep(SweepReport {
            status: "completed",
            message: None,
            results,
        })
    }

    fn empty() -> Self {
        BatchOutcome::Sweep(SweepReport {
            status: "empty",
            message: Some("No repositories found".to_string()),
            results: Vec::new(),
        })
    }
}

/// Drives marker generation across the repository store.
pub struct MarkerOrchestrator {
    store: RepoStore,
    agent: Arc<dyn AgentRunner>,
    git_cmd: String,
    git_timeout: Duration,
    analysis_timeout: Duration,
}

impl MarkerOrchestrator {
    pub fn new(store: RepoStore, agent: Arc<dyn AgentRunner>, settings: &AgentSettings) -> Self {
        Self {
            store,
            agent,
            git_cmd: settings.git_cmd.clone(),
            git_timeout: settings.clone_timeout,
            analysis_timeout: settings.analysis_timeout,
        }
    }

    /// Ensure the marker for one named repository, or sweep the store when
    /// `repo` is `None`. Single-repository errors are returned; sweep errors
    /// become entries.
    pub async fn ensure_marker_for(&self, repo: Option<&str>) -> Result<BatchOutcome, ServiceError> {
        match repo {
            Some(name) => self.ensure_one(name).await.map(BatchOutcome::Single),
            None => self.sweep().await,
        }
    }

    async fn sweep(&self) -> Result<BatchOutcome, ServiceError> {
        let repos = self.store.list().await?;
        if repos.is_empty() {
            tracing::info!(store = %self.store.root().display(), "no repositories to analyse");
            return Ok(BatchOutcome::empty());
        }

        let mut results = Vec::with_capacity(repos.len());
        for name in &repos {
            let result = self.ensure_one(name).await;
            if let Err(e) = &result {
                tracing::warn!(repo = %name, error = %e, "marker generation failed");
            }
            results.push(RepoBatchResult::from_result(name, result));
        }
        Ok(BatchOutcome::completed(results))
    }

    /// Ensure `luigi.md` exists in one repository.
    pub async fn ensure_one(&self, name: &str) -> Result<MarkerOutcome, ServiceError> {
        let path = self.store.resolve(name)?;

        let report = prepare_submodules(&path, &self.git_cmd, self.git_timeout).await;
        tracing::debug!(repo = name, status = ?report.status, "submodules prepared");

        if marker_exists(&path).await {
            return Ok(MarkerOutcome {
                repo: name.to_string(),
                status: OutcomeStatus::AlreadyExists,
                message: format!("{} already exists in {}", MARKER_FILE, name),
                output: None,
            });
        }

        tracing::info!(repo = name, "generating {}", MARKER_FILE);
        let invocation = AgentInvocation::new(
            AgentKind::ClaudeCode,
            build_marker_prompt(name),
            &path,
            self.analysis_timeout,
        );
        let result = self.agent.invoke(&invocation).await?;

        if !marker_exists(&path).await {
            return Err(ServiceError::VerificationFailed(format!(
                "{} reported success but {} was not created in {}. Output: {}",
                AgentKind::ClaudeCode,
                MARKER_FILE,
                name,
                result.stdout.trim()
            )));
        }

        Ok(MarkerOutcome {
            repo: name.to_string(),
            status: OutcomeStatus::Success,
            message: format!("Created {} in {}", MARKER_FILE, name),
            output: Some(result.stdout),
        })
    }
}

async fn marker_exists(repo_path: &Path) -> bool {
    tokio::fs::try_exists(repo_path.join(MARKER_FILE))
        .await
        .unwrap_or(false)
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::prompts::build_ticket_prompt;
use crate::agent::{AgentInvocation, AgentKind, AgentResult, AgentRunner, CliAgent};
use crate::config::Config;
use crate::errors::ServiceError;
use crate::jira::{IssueTracker, JiraClient, resolve_issue_key};
use crate::marker::{BatchOutcome, MarkerOrchestrator};
use crate::process::RunStatus;
use crate::repo::{RepoStore, clone_repository, prepare_submodules};
use crate::ticket::{find_affected_repositories, is_present, normalize, string_list};
use crate::ticket::{NO_DESCRIPTION, NO_TITLE, extract_text};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub config: Arc<Config>,
    pub store: RepoStore,
    pub tracker: Arc<dyn IssueTracker>,
    pub agent: Arc<dyn AgentRunner>,
}

impl AppState {
    /// Wire the real Jira client and CLI agent from configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let tracker = JiraClient::new(&config.jira).context("Failed to build Jira client")?;
        let agent = CliAgent::new(&config.agent.claude_cmd, &config.agent.codex_cmd);
        Ok(Self {
            store: RepoStore::new(&config.repos_dir),
            config: Arc::new(config),
            tracker: Arc::new(tracker),
            agent: Arc::new(agent),
        })
    }

    fn orchestrator(&self) -> MarkerOrchestrator {
        MarkerOrchestrator::new(self.store.clone(), self.agent.clone(), &self.config.agent)
    }

    /// Resolve a stored repository and bring its submodules up to date.
    async fn checkout(&self, name: &str) -> Result<PathBuf, ServiceError> {
        let path = self.store.resolve(name)?;
        let agent = &self.config.agent;
        let report = prepare_submodules(&path, &agent.git_cmd, agent.clone_timeout).await;
        tracing::debug!(repo = name, status = ?report.status, "submodules prepared");
        Ok(path)
    }
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub issue_id: Option<String>,
    pub issue_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub issue_id: Option<String>,
    pub issue_url: Option<String>,
    pub repository: Option<String>,
}

#[derive(Deserialize)]
pub struct AgentRequest {
    pub repo: String,
    pub query: String,
}

#[derive(Deserialize, Default)]
pub struct InitRequest {
    pub repo: Option<String>,
}

#[derive(Deserialize)]
pub struct CloneRequest {
    pub url: String,
}

// ── Response payload types ────────────────────────────────────────────

#[derive(Serialize)]
pub struct IssueResponse {
    pub issue_id: String,
    pub title: String,
    pub details: String,
    pub labels: Vec<String>,
    pub fields: Value,
    pub message: String,
}

#[derive(Serialize)]
pub struct ExecuteResponse {
    pub issue_key: String,
    pub title: String,
    pub analysis: String,
    pub status: RunStatus,
    pub affected_repositories: Option<Value>,
    pub stderr: Option<String>,
}

#[derive(Serialize)]
pub struct CloneResponse {
    pub status: &'static str,
    pub path: String,
}

// ── Error handling ────────────────────────────────────────────────────

pub const MISSING_AFFECTED_REPOS: &str = "Please fill 'Affected repositories'";
pub const READY_TO_WORK: &str = "I have enough information to work on this ticket";

/// `ServiceError` rendered as `{"error": message}` with the matching status.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::ToolMissing(_)
            | ServiceError::AgentFailure(_)
            | ServiceError::VerificationFailed(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/jira/issue", post(get_issue))
        .route("/jira/execute", post(execute_issue))
        .route("/codex", post(run_codex))
        .route("/claude-code", post(run_claude_code))
        .route("/luigi-init", post(luigi_init))
        .route("/repos/clone", post(clone_repo))
        .route("/clone", post(clone_repo))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_issue(
    State(state): State<SharedState>,
    Json(req): Json<IssueRequest>,
) -> Result<Json<IssueResponse>, ApiError> {
    let issue_key = resolve_issue_key(req.issue_id.as_deref(), req.issue_url.as_deref())?;
    let raw = state
        .tracker
        .fetch_issue(&issue_key)
        .await
        .map_err(ServiceError::from)?;

    let fields = raw.get("fields").cloned().unwrap_or_else(|| Value::Object(Default::default()));
    let message = match find_affected_repositories(&raw) {
        Some(_) => READY_TO_WORK,
        None => MISSING_AFFECTED_REPOS,
    };

    Ok(Json(IssueResponse {
        title: fields
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or(NO_TITLE)
            .to_string(),
        details: fields
            .get("description")
            .map(extract_text)
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        labels: string_list(fields.get("labels")),
        message: message.to_string(),
        issue_id: issue_key,
        fields,
    }))
}

async fn execute_issue(
    State(state): State<SharedState>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let issue_key = resolve_issue_key(req.issue_id.as_deref(), req.issue_url.as_deref())?;
    let raw = state
        .tracker
        .fetch_issue(&issue_key)
        .await
        .map_err(ServiceError::from)?;

    let task = normalize(&raw);
    if !task.is_actionable() {
        tracing::warn!(issue = %issue_key, "no affected repositories; refusing to run agent");
        return Err(ServiceError::Validation(
            "No affected repositories found for this issue".to_string(),
        )
        .into());
    }

    let working_dir = match req.repository.as_deref().filter(|r| !r.is_empty()) {
        Some(name) => state.checkout(name).await?,
        None => state.config.workdir.clone(),
    };

    let invocation = AgentInvocation::new(
        AgentKind::ClaudeCode,
        build_ticket_prompt(&task),
        working_dir,
        state.config.agent.ticket_timeout,
    );
    let result = state
        .agent
        .invoke(&invocation)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(ExecuteResponse {
        issue_key,
        title: task.title,
        analysis: result.stdout,
        status: result.status,
        affected_repositories: task.affected_repositories.filter(is_present),
        stderr: Some(result.stderr),
    }))
}

async fn run_agent(
    state: &AppState,
    kind: AgentKind,
    req: AgentRequest,
) -> Result<Json<AgentResult>, ApiError> {
    let repo_path = state.checkout(&req.repo).await?;
    let invocation = AgentInvocation::new(
        kind,
        req.query,
        repo_path,
        state.config.agent.interactive_timeout,
    );
    let result = state
        .agent
        .invoke(&invocation)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(result))
}

async fn run_codex(
    State(state): State<SharedState>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<AgentResult>, ApiError> {
    run_agent(&state, AgentKind::Codex, req).await
}

async fn run_claude_code(
    State(state): State<SharedState>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<AgentResult>, ApiError> {
    run_agent(&state, AgentKind::ClaudeCode, req).await
}

async fn luigi_init(
    State(state): State<SharedState>,
    body: Option<Json<InitRequest>>,
) -> Result<Json<BatchOutcome>, ApiError> {
    let repo = body
        .as_ref()
        .and_then(|Json(req)| req.repo.as_deref())
        .filter(|r| !r.is_empty());
    let outcome = state.orchestrator().ensure_marker_for(repo).await?;
    Ok(Json(outcome))
}

async fn clone_repo(
    State(state): State<SharedState>,
    Json(req): Json<CloneRequest>,
) -> Result<Json<CloneResponse>, ApiError> {
    let cloned = clone_repository(
        &state.store,
        &req.url,
        &state.config.git,
        &state.config.agent.git_cmd,
        state.config.agent.clone_timeout,
    )
    .await?;
    tracing::info!(repo = %cloned.name, path = %cloned.path, "repository cloned");
    Ok(Json(CloneResponse {
        status: "success",
        path: cloned.path,
    }))
}

//! Typed error hierarchy for luigi.
//!
//! Three enums cover the subsystems that can fail:
//! - `AgentError`: a single coding-agent invocation
//! - `TrackerError`: the issue-tracker REST boundary
//! - `ServiceError`: what the HTTP layer and CLI report to callers

use thiserror::Error;

/// Errors from one coding-agent invocation. All variants are terminal for
/// that invocation; nothing is retried.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{agent} CLI not found ({program}). {hint}")]
    ToolNotFound {
        agent: String,
        program: String,
        hint: String,
    },

    #[error("{agent} CLI timed out after {secs}s")]
    TimedOut { agent: String, secs: u64 },

    #[error("{agent} CLI failed: {output}")]
    NonZeroExit {
        agent: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Failed to run {agent} CLI: {source}")]
    Spawn {
        agent: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the issue-tracker client.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(
        "Missing Jira credentials in environment variables (JIRA_BASE_URL/JIRA_URL, JIRA_EMAIL/JIRA_USERNAME, JIRA_API_TOKEN)"
    )]
    MissingCredentials,

    #[error("Error from Jira API: {body}")]
    Status { status: u16, body: String },

    #[error("Request to Jira API timed out")]
    Timeout,

    #[error("Error connecting to Jira API: {0}")]
    Connection(String),

    #[error("Failed to decode Jira API response: {0}")]
    Decode(String),
}

/// Caller-facing error taxonomy. Each variant maps to exactly one HTTP status.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    ToolMissing(String),

    #[error("{0}")]
    AgentFailure(String),

    #[error("{0}")]
    VerificationFailed(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn repo_not_found(name: &str) -> Self {
        ServiceError::NotFound(format!(
            "Repository '{}' not found. Please clone it first.",
            name
        ))
    }
}

impl From<AgentError> for ServiceError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::ToolNotFound { .. } => ServiceError::ToolMissing(err.to_string()),
            AgentError::TimedOut { ref agent, .. } => ServiceError::Timeout(format!(
                "{} CLI timed out. Try a simpler query.",
                agent
            )),
            AgentError::NonZeroExit { .. } => ServiceError::AgentFailure(err.to_string()),
            AgentError::Spawn { .. } => ServiceError::Internal(err.to_string()),
        }
    }
}

impl From<TrackerError> for ServiceError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::MissingCredentials | TrackerError::Decode(_) => {
                ServiceError::Internal(err.to_string())
            }
            TrackerError::Status { status, .. } => ServiceError::Upstream {
                status,
                message: err.to_string(),
            },
            TrackerError::Timeout => ServiceError::Timeout(err.to_string()),
            TrackerError::Connection(_) => ServiceError::Upstream {
                status: 502,
                message: err.to_string(),
            },
        }
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::Internal(format!("{:#}", err))
    }
}

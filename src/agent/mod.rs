//! Coding-agent invocation.
//!
//! An [`AgentInvocation`] names which CLI to run, the free-text prompt, the
//! working directory and a wall-clock bound. [`CliAgent`] turns it into a
//! single non-interactive command line and maps the process outcome onto
//! [`AgentResult`] or [`AgentError`]. Invocations are never retried.
//!
//! The [`AgentRunner`] trait is the seam the orchestrator and HTTP layer
//! depend on, so tests can substitute a recording fake.

pub mod prompts;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::AgentError;
use crate::process::{ProcessError, RunStatus, run_command};

/// Capability grants passed to Claude Code on every run. Not configurable per call.
pub const CLAUDE_ALLOWED_TOOLS: &[&str] = &[
    "Edit",       // edit files
    "Bash",       // run shell commands
    "Search",     // search the codebase
    "FileSearch", // find files
    "ListDir",    // list directories
    "Read",       // read files
    "Git",        // version-control operations
];

/// Which external coding agent to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    ClaudeCode,
    Codex,
}

impl AgentKind {
    pub fn display_name(self) -> &'static str {
        match self {
            AgentKind::ClaudeCode => "Claude Code",
            AgentKind::Codex => "Codex",
        }
    }

    pub fn install_hint(self) -> &'static str {
        match self {
            AgentKind::ClaudeCode => {
                "Make sure it's installed (npm install -g @anthropic-ai/claude-code)."
            }
            AgentKind::Codex => "Make sure it's installed (npm install -g @openai/codex).",
        }
    }

    /// Arguments (after the program name) for a non-interactive run of `prompt`.
    pub fn args(self, prompt: &str) -> Vec<String> {
        match self {
            AgentKind::ClaudeCode => {
                let mut args = vec![
                    "-p".to_string(),
                    prompt.to_string(),
                    "--allowedTools".to_string(),
                ];
                args.extend(CLAUDE_ALLOWED_TOOLS.iter().map(|t| t.to_string()));
                args
            }
            AgentKind::Codex => vec![
                "-q".to_string(),
                "-a".to_string(),
                "full-auto".to_string(),
                prompt.to_string(),
            ],
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One request to run a coding agent.
#[derive(Debug, Clone)]
pub struct AgentInvocation {
    pub kind: AgentKind,
    pub prompt: String,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

impl AgentInvocation {
    pub fn new(
        kind: AgentKind,
        prompt: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            working_dir: working_dir.into(),
            timeout,
        }
    }
}

/// Output of an agent run that exited successfully.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResult {
    pub status: RunStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Abstraction over agent execution for testability.
/// Real implementation: `CliAgent`.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn invoke(&self, invocation: &AgentInvocation) -> Result<AgentResult, AgentError>;
}

/// Runs agents as local CLI processes.
#[derive(Debug, Clone)]
pub struct CliAgent {
    claude_cmd: String,
    codex_cmd: String,
}

impl CliAgent {
    pub fn new(claude_cmd: impl Into<String>, codex_cmd: impl Into<String>) -> Self {
        Self {
            claude_cmd: claude_cmd.into(),
            codex_cmd: codex_cmd.into(),
        }
    }

    pub fn program(&self, kind: AgentKind) -> &str {
        match kind {
            AgentKind::ClaudeCode => &self.claude_cmd,
            AgentKind::Codex => &self.codex_cmd,
        }
    }
}

#[async_trait]
impl AgentRunner for CliAgent {
    async fn invoke(&self, invocation: &AgentInvocation) -> Result<AgentResult, AgentError> {
        let kind = invocation.kind;
        let program = self.program(kind);
        let args = kind.args(&invocation.prompt);

        tracing::info!(
            agent = %kind,
            cwd = %invocation.working_dir.display(),
            timeout_secs = invocation.timeout.as_secs(),
            "starting agent run"
        );
        let started = std::time::Instant::now();

        let output = run_command(program, &args, &invocation.working_dir, invocation.timeout)
            .await
            .map_err(|err| match err {
                ProcessError::NotFound { program } => AgentError::ToolNotFound {
                    agent: kind.display_name().to_string(),
                    program,
                    hint: kind.install_hint().to_string(),
                },
                ProcessError::TimedOut { secs, .. } => AgentError::TimedOut {
                    agent: kind.display_name().to_string(),
                    secs,
                },
                ProcessError::Io { source, .. } => AgentError::Spawn {
                    agent: kind.display_name().to_string(),
                    source,
                },
            })
            .inspect_err(|err| tracing::warn!(agent = %kind, error = %err, "agent run failed"))?;

        if !output.success() {
            tracing::warn!(
                agent = %kind,
                code = ?output.status.code(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "agent exited with non-zero status"
            );
            return Err(AgentError::NonZeroExit {
                agent: kind.display_name().to_string(),
                code: output.status.code(),
                output: output.error_output().to_string(),
            });
        }

        tracing::info!(
            agent = %kind,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "agent run finished"
        );
        Ok(AgentResult {
            status: RunStatus::Success,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

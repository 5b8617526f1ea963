//! One-shot marker generation — `luigi init [--repo NAME]`.

use std::sync::Arc;

use anyhow::{Context, Result};

use luigi::agent::CliAgent;
use luigi::config::Config;
use luigi::marker::MarkerOrchestrator;
use luigi::repo::RepoStore;

pub async fn cmd_init(config: Config, repo: Option<&str>) -> Result<()> {
    let agent = Arc::new(CliAgent::new(
        &config.agent.claude_cmd,
        &config.agent.codex_cmd,
    ));
    let orchestrator =
        MarkerOrchestrator::new(RepoStore::new(&config.repos_dir), agent, &config.agent);

    let outcome = orchestrator.ensure_marker_for(repo).await?;
    let rendered =
        serde_json::to_string_pretty(&outcome).context("Failed to render init outcome")?;
    println!("{}", rendered);
    Ok(())
}

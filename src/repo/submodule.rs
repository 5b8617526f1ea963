//! Best-effort submodule preparation before an agent touches a checkout.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::process::{RunStatus, run_command};

/// What happened when preparing submodules. Failures are reported, never raised.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct SubmoduleReport {
    pub status: RunStatus,
    pub message: String,
}

impl SubmoduleReport {
    fn error(message: String) -> Self {
        Self {
            status: RunStatus::Error,
            message,
        }
    }
}

/// Run `git submodule init` then `git submodule update` in `repo_path`.
///
/// Steps run in order and stop at the first failure. A repository without
/// submodules succeeds trivially.
pub async fn prepare_submodules(
    repo_path: &Path,
    git_cmd: &str,
    timeout: Duration,
) -> SubmoduleReport {
    for step in ["init", "update"] {
        let result = run_command(git_cmd, &["submodule", step], repo_path, timeout).await;
        let failure = match result {
            Ok(output) if output.success() => continue,
            Ok(output) => format!("git submodule {} failed: {}", step, output.combined()),
            Err(e) => format!("git submodule {} failed: {}", step, e),
        };
        tracing::warn!(repo = %repo_path.display(), error = %failure, "submodule preparation failed");
        return SubmoduleReport::error(failure);
    }

    SubmoduleReport {
        status: RunStatus::Success,
        message: "Submodules initialized and updated".to_string(),
    }
}

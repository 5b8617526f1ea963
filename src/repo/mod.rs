//! The repository store: a directory holding one checkout per repository.
//!
//! | Module      | Responsibility                                         |
//! |-------------|--------------------------------------------------------|
//! | (this)      | `RepoStore`: name to path resolution and listing       |
//! | `clone`     | `git clone` with host-aware credential injection       |
//! | `submodule` | best-effort submodule init/update before agent runs    |

pub mod clone;
pub mod submodule;

use std::path::{Path, PathBuf};

use crate::errors::ServiceError;

pub use clone::{
    ClonedRepo, GitHost, authenticated_url, clone_repository, redact_url, repo_name_from_url,
};
pub use submodule::{SubmoduleReport, prepare_submodules};

/// Maps repository names to checkouts under a single root directory.
#[derive(Debug, Clone)]
pub struct RepoStore {
    root: PathBuf,
}

impl RepoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `name` lives (or would live). Rejects names that could escape the store.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, ServiceError> {
        validate_repo_name(name)?;
        Ok(self.root.join(name))
    }

    /// Path of an existing checkout, or `NotFound`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, ServiceError> {
        let path = self.path_for(name)?;
        if path.is_dir() {
            Ok(path)
        } else {
            Err(ServiceError::repo_not_found(name))
        }
    }

    /// Names of every directory directly under the store, sorted.
    /// A missing store is treated as empty.
    pub async fn list(&self) -> Result<Vec<String>, ServiceError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ServiceError::Internal(format!(
                    "Failed to list repositories in {}: {}",
                    self.root.display(),
                    e
                )));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            ServiceError::Internal(format!("Failed to read repository entry: {}", e))
        })? {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Reject names that are empty, `.`/`..`, or contain path separators.
pub fn validate_repo_name(name: &str) -> Result<(), ServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed != name
    {
        return Err(ServiceError::Validation(format!(
            "Invalid repository name '{}'",
            name
        )));
    }
    Ok(())
}

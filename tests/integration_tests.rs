//! Integration tests for the luigi CLI.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a luigi Command isolated from the caller's environment
fn luigi(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("luigi");
    cmd.current_dir(dir)
        .env_remove("LUIGI_REPOS_DIR")
        .env_remove("CLAUDE_CMD")
        .env_remove("CODEX_CMD")
        .env_remove("LUIGI_PORT")
        .env("GIT_CMD", "true")
        .env("RUST_LOG", "off");
    cmd
}

#[cfg(unix)]
fn write_fake_claude(dir: &Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-claude.sh");
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_luigi_help() {
        let dir = TempDir::new().unwrap();
        luigi(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"))
            .stdout(predicate::str::contains("init"));
    }

    #[test]
    fn test_luigi_version() {
        let dir = TempDir::new().unwrap();
        luigi(dir.path()).arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        let dir = TempDir::new().unwrap();
        luigi(dir.path()).arg("deploy").assert().failure();
    }

    #[test]
    fn test_invalid_config_file_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("luigi.toml"), "[server]\nbogus = 1\n").unwrap();
        luigi(dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("luigi.toml"));
    }
}

// =============================================================================
// Marker generation (`luigi init`)
// =============================================================================

mod init {
    use super::*;

    #[test]
    fn test_init_empty_store() {
        let dir = TempDir::new().unwrap();
        luigi(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\": \"empty\""))
            .stdout(predicate::str::contains("No repositories found"));
    }

    #[test]
    fn test_init_unknown_repo_fails() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("repos")).unwrap();
        luigi(dir.path())
            .args(["init", "--repo", "ghost"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Repository 'ghost' not found"));
    }

    #[test]
    fn test_init_existing_marker_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("repos/web")).unwrap();
        fs::write(dir.path().join("repos/web/luigi.md"), "# web").unwrap();

        luigi(dir.path())
            .args(["init", "--repo", "web"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\": \"already_exists\""));
    }

    #[test]
    fn test_init_respects_repos_dir_flag() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("elsewhere/api")).unwrap();
        fs::write(dir.path().join("elsewhere/api/luigi.md"), "# api").unwrap();

        luigi(dir.path())
            .args(["init", "--repos-dir", "elsewhere"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"repo\": \"api\""));
    }

    #[cfg(unix)]
    #[test]
    fn test_init_sweep_with_fake_agent() {
        let dir = TempDir::new().unwrap();
        for name in ["alpha", "beta"] {
            fs::create_dir_all(dir.path().join("repos").join(name)).unwrap();
        }
        let claude = write_fake_claude(dir.path(), "echo '# guide' > luigi.md\necho analysed\n");

        luigi(dir.path())
            .env("CLAUDE_CMD", &claude)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\": \"completed\""))
            .stdout(predicate::str::contains("\"repo\": \"beta\""));

        assert!(dir.path().join("repos/alpha/luigi.md").exists());
        assert!(dir.path().join("repos/beta/luigi.md").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_init_sweep_records_agent_failure() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("repos/broken")).unwrap();
        let claude = write_fake_claude(dir.path(), "echo 'model overloaded' >&2\nexit 1\n");

        luigi(dir.path())
            .env("CLAUDE_CMD", &claude)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\": \"error\""))
            .stdout(predicate::str::contains("model overloaded"));
    }

    #[test]
    fn test_init_missing_agent_reports_install_hint() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("repos/web")).unwrap();

        luigi(dir.path())
            .env("CLAUDE_CMD", "/nonexistent/claude")
            .args(["init", "--repo", "web"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("npm install -g @anthropic-ai/claude-code"));
    }
}

//! Scoped execution of external commands.
//!
//! Every external tool luigi drives (coding agents, `git`) goes through
//! [`run_command`]: the child is spawned with piped output, awaited under a
//! hard wall-clock bound, and its whole process group is killed when the
//! run ends. The child handle never escapes this module, and dropping the
//! calling future (e.g. the HTTP client disconnects) kills the group too.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::{AbortHandle, JoinHandle};

/// Outcome flag reported alongside captured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Captured result of a command that ran to completion.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// stderr when it has content, stdout otherwise.
    pub fn error_output(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }

    /// stdout and stderr joined, for tools that interleave progress on both.
    pub fn combined(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("executable '{program}' not found")]
    NotFound { program: String },

    #[error("'{program}' timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },

    #[error("failed to run '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run `program args...` in `cwd`, capturing output, with a hard timeout.
///
/// The child leads its own process group. The timeout covers both the wait
/// and draining the pipes, and the whole group is killed once the child
/// exits, on expiry, or when the future is dropped, so nothing it started
/// outlives the call.
///
/// A non-zero exit is *not* an error here; callers decide what it means.
pub async fn run_command<S: AsRef<str>>(
    program: &str,
    args: &[S],
    cwd: &Path,
    timeout: Duration,
) -> Result<CommandOutput, ProcessError> {
    let mut command = Command::new(program);
    command
        .args(args.iter().map(AsRef::as_ref))
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|source| match source.kind() {
        ErrorKind::NotFound => ProcessError::NotFound {
            program: program.to_string(),
        },
        _ => ProcessError::Io {
            program: program.to_string(),
            source,
        },
    })?;
    let group = ProcessGroup(child.id());

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let readers: Vec<AbortHandle> = [&stdout, &stderr]
        .into_iter()
        .flatten()
        .map(JoinHandle::abort_handle)
        .collect();

    let run = async {
        let status = child.wait().await;
        // Background jobs the child left behind still hold the pipes open.
        group.terminate();
        (status, collect(stdout).await, collect(stderr).await)
    };

    match tokio::time::timeout(timeout, run).await {
        Ok((status, stdout, stderr)) => Ok(CommandOutput {
            status: status.map_err(|source| ProcessError::Io {
                program: program.to_string(),
                source,
            })?,
            stdout,
            stderr,
        }),
        Err(_) => {
            group.terminate();
            if let Err(e) = child.kill().await {
                tracing::warn!(program, error = %e, "failed to kill timed-out process");
            }
            for reader in readers {
                reader.abort();
            }
            Err(ProcessError::TimedOut {
                program: program.to_string(),
                secs: timeout.as_secs(),
            })
        }
    }
}

/// Process group led by a spawned child; killed when dropped.
struct ProcessGroup(Option<u32>);

impl ProcessGroup {
    #[cfg(unix)]
    fn terminate(&self) {
        if let Some(pgid) = self.0.and_then(|pid| libc::pid_t::try_from(pid).ok()) {
            // SAFETY: killpg only sends a signal. ESRCH once the group is gone is expected.
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
        }
    }

    #[cfg(not(unix))]
    fn terminate(&self) {}
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn drain<R>(mut reader: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf).await {
            tracing::debug!(error = %e, "output pipe closed early");
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn collect(reader: Option<JoinHandle<String>>) -> String {
    match reader {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

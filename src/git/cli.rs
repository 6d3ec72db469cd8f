//! Production [`VersionControlPort`] adapter that shells out to `git`.
//!
//! Every query spawns one `git -C <repo> ...` process, inheriting the user's
//! git config. Each spawn is bounded by a timeout; the child is killed when
//! the timeout fires.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::GitError;

use super::port::{DiffTarget, LogQuery, VersionControlPort};

/// Default timeout for a single git query.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable to override the default timeout.
pub const TIMEOUT_ENV_VAR: &str = "AUTO_PR_GIT_TIMEOUT";

/// Separator between header fields in log output (ASCII unit separator).
pub const LOG_FIELD_SEPARATOR: char = '\x1f';

/// Log header: hash, subject, author name, author email, unix timestamp.
const LOG_PRETTY_FORMAT: &str = "--pretty=format:%H%x1f%s%x1f%an%x1f%ae%x1f%at";

/// `git remote get-url` exits with 2 when the remote does not exist.
const NO_SUCH_REMOTE_EXIT: i32 = 2;

/// Get the configured per-query timeout.
///
/// Reads from AUTO_PR_GIT_TIMEOUT if set, otherwise uses 30 seconds.
/// Logs a warning if the variable is set but not a valid number.
pub fn query_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Check that a `git` executable is available on PATH.
pub fn check_git_installed() -> Result<(), GitError> {
    which::which("git")
        .map(|_| ())
        .map_err(|_| GitError::NotInstalled)
}

/// Runs git queries against one working copy.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_path: PathBuf,
    timeout: Duration,
}

impl GitCli {
    /// Create an adapter for `repo_path` using the configured timeout.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            timeout: query_timeout(),
        }
    }

    /// Override the per-query timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Spawn git and wait for it, bounded by the timeout.
    async fn exec(&self, args: &[&str]) -> Result<Output, GitError> {
        let command = args.join(" ");
        debug!(repo = %self.repo_path.display(), "git {}", command);
        let started = Instant::now();

        let result = timeout(
            self.timeout,
            Command::new("git")
                .arg("-C")
                .arg(&self.repo_path)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| GitError::Timeout {
            command: command.clone(),
            timeout: self.timeout,
        })?;

        let output = result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::NotInstalled
            } else {
                GitError::SpawnFailed(e)
            }
        })?;

        debug!(
            "git {} exited with {} after {:?}",
            command,
            output.status,
            started.elapsed()
        );
        Ok(output)
    }

    /// Run git and return stdout untouched, failing on a non-zero exit.
    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.exec(args).await?;

        if !output.status.success() {
            return Err(query_failed(args, &output));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run git for its exit status only.
    async fn succeeds(&self, args: &[&str]) -> Result<bool, GitError> {
        Ok(self.exec(args).await?.status.success())
    }

    async fn diff(
        &self,
        options: &[&str],
        target: &DiffTarget,
        paths: &[&str],
    ) -> Result<String, GitError> {
        let target_args = target.diff_args();
        let mut args = vec!["diff", "--no-color", "--no-ext-diff"];
        args.extend_from_slice(options);
        args.extend(target_args.iter().map(String::as_str));
        if !paths.is_empty() {
            args.push("--");
            args.extend_from_slice(paths);
        }
        self.run(&args).await
    }
}

fn query_failed(args: &[&str], output: &Output) -> GitError {
    GitError::QueryFailed {
        command: args.first().copied().unwrap_or_default().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

#[async_trait]
impl VersionControlPort for GitCli {
    async fn current_branch(&self) -> Result<String, GitError> {
        let stdout = self.run(&["branch", "--show-current"]).await?;
        Ok(stdout.trim().to_string())
    }

    async fn remote_url(&self, remote: &str) -> Result<Option<String>, GitError> {
        let args = ["remote", "get-url", remote];
        let output = self.exec(&args).await?;

        if output.status.success() {
            let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
            return Ok(Some(url));
        }
        if output.status.code() == Some(NO_SUCH_REMOTE_EXIT) {
            return Ok(None);
        }
        Err(query_failed(&args, &output))
    }

    async fn symbolic_ref(&self, name: &str) -> Result<Option<String>, GitError> {
        let output = self.exec(&["symbolic-ref", "--quiet", name]).await?;
        if !output.status.success() {
            return Ok(None);
        }
        let target = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!target.is_empty()).then_some(target))
    }

    async fn ref_exists(&self, full_ref: &str) -> Result<bool, GitError> {
        self.succeeds(&["show-ref", "--verify", "--quiet", full_ref]).await
    }

    async fn verify_revision(&self, revision: &str) -> Result<bool, GitError> {
        self.succeeds(&["rev-parse", "--verify", "--quiet", revision])
            .await
    }

    async fn status_porcelain(&self) -> Result<String, GitError> {
        // Leading spaces are significant here; never trim.
        self.run(&["status", "--porcelain=v1"]).await
    }

    async fn log(&self, query: &LogQuery) -> Result<String, GitError> {
        let limit_arg = query.limit.map(|n| format!("-{}", n));
        let mut args = vec!["log"];
        if let Some(limit) = &limit_arg {
            args.push(limit);
        }
        args.push(LOG_PRETTY_FORMAT);
        args.push("--name-only");
        if let Some(range) = &query.range {
            args.push(range);
        }
        args.push("--");
        self.run(&args).await
    }

    async fn rev_list_count(&self, range: &str) -> Result<String, GitError> {
        self.run(&["rev-list", "--count", range, "--"]).await
    }

    async fn diff_name_status(&self, target: &DiffTarget) -> Result<String, GitError> {
        self.diff(&["--name-status"], target, &[]).await
    }

    async fn diff_numstat(
        &self,
        target: &DiffTarget,
        paths: &[String],
    ) -> Result<String, GitError> {
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
        self.diff(&["--numstat"], target, &paths).await
    }

    async fn diff_stat(&self, target: &DiffTarget) -> Result<String, GitError> {
        self.diff(&["--stat"], target, &[]).await
    }

    async fn diff_patch(&self, target: &DiffTarget) -> Result<String, GitError> {
        self.diff(&[], target, &[]).await
    }
}

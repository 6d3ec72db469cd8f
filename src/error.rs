//! Error types for auto-pr modules using thiserror.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from version control queries and change analysis.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("No '{0}' remote configured. Add one with: git remote add {0} <url>")]
    RemoteNotConfigured(String),

    #[error("Base branch '{0}' not found locally or on the remote. Fetch it or pass --base")]
    BaseBranchNotFound(String),

    #[error("git {command} failed: {stderr}")]
    QueryFailed { command: String, stderr: String },

    #[error("Unexpected git output: {0}")]
    Parse(String),

    #[error("Failed to spawn git process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git {command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("git executable not found on PATH")]
    NotInstalled,
}

impl GitError {
    /// Whether this error stems from a missing precondition the user can fix,
    /// as opposed to a failing external query.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            GitError::NotARepository(_)
                | GitError::RemoteNotConfigured(_)
                | GitError::BaseBranchNotFound(_)
                | GitError::NotInstalled
        )
    }
}

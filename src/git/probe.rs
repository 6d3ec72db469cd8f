//! Repository probing: identity, remote, and base branch resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GitError;

use super::port::VersionControlPort;

/// Remote consulted for URLs, default branch, and remote-tracking refs.
pub const DEFAULT_REMOTE: &str = "origin";

/// Branch names tried, in order, when the remote advertises no default.
pub const BASE_BRANCH_CANDIDATES: &[&str] = &["main", "master", "develop"];

/// Base branch used when nothing else resolves.
pub const FALLBACK_BASE_BRANCH: &str = "main";

/// Identity of a working copy, computed fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    pub current_branch: String,
    pub base_branch: String,
    pub remote_url: Option<String>,
}

/// Check whether `path` holds git metadata.
///
/// `.git` may be a directory or, for linked worktrees and submodules, a file.
pub fn is_repository(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Fail with [`GitError::NotARepository`] unless `path` is a working copy.
pub fn ensure_repository(path: &Path) -> Result<(), GitError> {
    if is_repository(path) {
        Ok(())
    } else {
        Err(GitError::NotARepository(path.to_path_buf()))
    }
}

/// Get the current branch name.
///
/// A detached HEAD has no branch and is reported as a query failure.
pub async fn current_branch<P>(port: &P) -> Result<String, GitError>
where
    P: VersionControlPort + ?Sized,
{
    let branch = port.current_branch().await?;
    if branch.is_empty() {
        return Err(GitError::QueryFailed {
            command: "branch".to_string(),
            stderr: "HEAD is detached; check out a branch first".to_string(),
        });
    }
    Ok(branch)
}

/// Get the URL of the primary remote.
pub async fn remote_url<P>(port: &P) -> Result<String, GitError>
where
    P: VersionControlPort + ?Sized,
{
    port.remote_url(DEFAULT_REMOTE)
        .await?
        .ok_or_else(|| GitError::RemoteNotConfigured(DEFAULT_REMOTE.to_string()))
}

/// Determine the base branch.
///
/// Resolution order:
/// 1. the remote's advertised default (`refs/remotes/origin/HEAD`)
/// 2. the first of main/master/develop present as a remote-tracking ref
/// 3. `main`
pub async fn base_branch<P>(port: &P) -> Result<String, GitError>
where
    P: VersionControlPort + ?Sized,
{
    let head_ref = format!("refs/remotes/{}/HEAD", DEFAULT_REMOTE);
    if let Some(target) = port.symbolic_ref(&head_ref).await? {
        if let Some(name) = target.rsplit('/').next().filter(|s| !s.is_empty()) {
            debug!("Base branch {} advertised by {}", name, DEFAULT_REMOTE);
            return Ok(name.to_string());
        }
    }

    for candidate in BASE_BRANCH_CANDIDATES {
        let tracking = format!("refs/remotes/{}/{}", DEFAULT_REMOTE, candidate);
        if port.ref_exists(&tracking).await? {
            debug!("Base branch {} found as {}", candidate, tracking);
            return Ok(candidate.to_string());
        }
    }

    debug!("No base branch detected, falling back to {}", FALLBACK_BASE_BRANCH);
    Ok(FALLBACK_BASE_BRANCH.to_string())
}

/// Resolve a base branch name to a revision usable in a range.
///
/// Prefers the remote-tracking ref, then the local branch. An empty name
/// means the fallback base branch.
pub async fn resolve_base_ref<P>(port: &P, base: &str) -> Result<String, GitError>
where
    P: VersionControlPort + ?Sized,
{
    let base = if base.is_empty() { FALLBACK_BASE_BRANCH } else { base };

    let remote_tracking = format!("{}/{}", DEFAULT_REMOTE, base);
    if port.verify_revision(&remote_tracking).await? {
        return Ok(remote_tracking);
    }

    if port.verify_revision(base).await? {
        return Ok(base.to_string());
    }

    Err(GitError::BaseBranchNotFound(base.to_string()))
}

/// Resolve branch, base, and remote URL in one pass.
///
/// A missing remote is recorded as `None` rather than failing.
pub async fn identity<P>(port: &P) -> Result<RepositoryIdentity, GitError>
where
    P: VersionControlPort + ?Sized,
{
    let current_branch = current_branch(port).await?;
    let base_branch = base_branch(port).await?;
    let remote_url = match remote_url(port).await {
        Ok(url) => Some(url),
        Err(GitError::RemoteNotConfigured(_)) => None,
        Err(e) => return Err(e),
    };

    Ok(RepositoryIdentity {
        current_branch,
        base_branch,
        remote_url,
    })
}

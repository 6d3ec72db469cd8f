//! Pull request context handed to AI and hosting-platform collaborators.
//!
//! Everything here is plain, serializable data; prompt construction and
//! PR creation live outside this crate.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GitError;
use crate::git::compare::compare_target;
use crate::git::diff::{ChangeSummary, PatchText, patch};
use crate::git::history::{CommitRecord, commits_since};
use crate::git::port::{DiffTarget, VersionControlPort};
use crate::git::probe::{self, RepositoryIdentity, resolve_base_ref};
use crate::git::remote::{Platform, RemoteLocation, parse_remote};

/// Everything needed to describe the current branch as a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestContext {
    pub identity: RepositoryIdentity,
    /// Revision the branch was compared against, e.g. `origin/main`.
    pub base_ref: String,
    pub platform: Platform,
    pub remote: Option<RemoteLocation>,
    pub summary: ChangeSummary,
    pub commits: Vec<CommitRecord>,
    pub diff: PatchText,
}

impl PullRequestContext {
    /// Whether there is anything to open a pull request for.
    pub fn has_changes(&self) -> bool {
        !self.commits.is_empty() || !self.summary.is_empty()
    }

    /// Subject of the newest commit when the branch has exactly one.
    pub fn single_commit_subject(&self) -> Option<&str> {
        match self.commits.as_slice() {
            [only] => Some(only.message.as_str()),
            _ => None,
        }
    }
}

/// Gather identity, branch comparison, commits, and patch for `base`.
///
/// When `base` is `None` the probed base branch is used.
pub async fn gather_pr_context<P>(
    port: &P,
    path: &Path,
    base: Option<&str>,
) -> Result<PullRequestContext, GitError>
where
    P: VersionControlPort + ?Sized,
{
    probe::ensure_repository(path)?;

    let mut identity = probe::identity(port).await?;
    if let Some(base) = base {
        identity.base_branch = base.to_string();
    }

    let base_ref = resolve_base_ref(port, &identity.base_branch).await?;
    let target = DiffTarget::three_dot(&base_ref);

    let summary = compare_target(port, &target).await?;
    let commits = commits_since(port, &identity.base_branch).await?;
    let diff = patch(port, &target).await?;

    let remote = identity.remote_url.as_deref().and_then(parse_remote);
    let platform = remote
        .as_ref()
        .map(RemoteLocation::platform)
        .unwrap_or(Platform::Unknown);

    Ok(PullRequestContext {
        identity,
        base_ref,
        platform,
        remote,
        summary,
        commits,
        diff,
    })
}

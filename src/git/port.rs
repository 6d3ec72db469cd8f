//! The version control capability the analysis engine is written against.
//!
//! Each method maps to exactly one query shape against the underlying tool.
//! Methods return raw text; parsing lives in the engine modules so that the
//! same parsers run against the real adapter and against in-memory fakes.

use std::fmt;

use async_trait::async_trait;

use crate::error::GitError;

/// Which pair of trees a diff query compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    /// Index against HEAD (`git diff --staged`).
    Staged,
    /// Working tree against the index (`git diff`).
    Unstaged,
    /// A revision range such as `origin/main...HEAD`.
    Range(String),
}

impl DiffTarget {
    /// Three-dot range between `base` and HEAD, relative to their merge base.
    pub fn three_dot(base: &str) -> Self {
        DiffTarget::Range(format!("{}...HEAD", base))
    }

    /// Extra arguments that select this target for `git diff`.
    pub fn diff_args(&self) -> Vec<String> {
        match self {
            DiffTarget::Staged => vec!["--staged".to_string()],
            DiffTarget::Unstaged => Vec::new(),
            DiffTarget::Range(range) => vec![range.clone()],
        }
    }
}

impl fmt::Display for DiffTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffTarget::Staged => write!(f, "staged"),
            DiffTarget::Unstaged => write!(f, "unstaged"),
            DiffTarget::Range(range) => write!(f, "{}", range),
        }
    }
}

/// Parameters for a log listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Revision range; `None` walks from HEAD.
    pub range: Option<String>,
    /// Maximum number of commits; `None` is unbounded.
    pub limit: Option<usize>,
}

/// Trait for running version control queries.
///
/// This abstraction allows exercising the engine against a fake in tests
/// while [`GitCli`](super::cli::GitCli) shells out to `git` in production.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionControlPort: Send + Sync {
    /// Name of the checked-out branch; empty when HEAD is detached.
    async fn current_branch(&self) -> Result<String, GitError>;

    /// URL of the named remote, or `None` when no such remote exists.
    async fn remote_url(&self, remote: &str) -> Result<Option<String>, GitError>;

    /// Target of a symbolic ref such as `refs/remotes/origin/HEAD`.
    async fn symbolic_ref(&self, name: &str) -> Result<Option<String>, GitError>;

    /// Whether a fully qualified ref exists (`git show-ref --verify`).
    async fn ref_exists(&self, full_ref: &str) -> Result<bool, GitError>;

    /// Whether a revision resolves (`git rev-parse --verify`).
    async fn verify_revision(&self, revision: &str) -> Result<bool, GitError>;

    /// Porcelain v1 status listing: two status characters, a space, the path.
    async fn status_porcelain(&self) -> Result<String, GitError>;

    /// Log listing with one delimited header per commit followed by its files.
    async fn log(&self, query: &LogQuery) -> Result<String, GitError>;

    /// Raw output of `git rev-list --count <range>`.
    async fn rev_list_count(&self, range: &str) -> Result<String, GitError>;

    /// Name-status listing: status code, tab, path(s).
    async fn diff_name_status(&self, target: &DiffTarget) -> Result<String, GitError>;

    /// Numeric stat listing limited to `paths`.
    ///
    /// A rename or copy is only recognised when both its source and its
    /// destination are listed.
    async fn diff_numstat(
        &self,
        target: &DiffTarget,
        paths: &[String],
    ) -> Result<String, GitError>;

    /// Human stat listing: `path | count +++--`.
    async fn diff_stat(&self, target: &DiffTarget) -> Result<String, GitError>;

    /// Unified patch text.
    async fn diff_patch(&self, target: &DiffTarget) -> Result<String, GitError>;
}

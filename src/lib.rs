//! auto-pr - A CLI tool that turns a git working copy into pull request context.
//!
//! # Overview
//!
//! auto-pr inspects a repository through a small set of git queries, reconciles
//! their overlapping output into a deduplicated model of what changed, and
//! packages that model for AI prompt builders and PR creation clients.

pub mod error;
pub mod git;
pub mod pr;

// Re-export commonly used types
pub use error::GitError;
pub use git::{
    ChangeSummary, CommitRecord, DiffTarget, FileChange, FileStatus, GitCli, RepositoryIdentity,
    VersionControlPort,
};
pub use pr::PullRequestContext;

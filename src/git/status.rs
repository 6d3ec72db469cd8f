//! Working tree status: staged, unstaged, and untracked paths.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GitError;

use super::history::{Divergence, divergence};
use super::port::VersionControlPort;
use super::probe::{self, RepositoryIdentity};

/// Paths partitioned by where their changes live.
///
/// A partially staged file appears in both `staged` and `unstaged`.
/// `untracked` never overlaps with either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatuses {
    pub staged: Vec<String>,
    pub unstaged: Vec<String>,
    pub untracked: Vec<String>,
}

impl FileStatuses {
    pub fn has_changes(&self) -> bool {
        !self.staged.is_empty() || !self.unstaged.is_empty() || !self.untracked.is_empty()
    }
}

/// Everything known about a working copy at one moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub identity: RepositoryIdentity,
    pub files: FileStatuses,
    pub has_changes: bool,
    /// `None` when the base branch could not be resolved.
    pub divergence: Option<Divergence>,
}

/// Partition porcelain v1 status output.
///
/// Each line is `XY path`. X (index) marks a staged change, Y (worktree) an
/// unstaged one; `??` marks an untracked path. Quoted or escaped paths are
/// passed through as git printed them.
pub fn parse_porcelain(output: &str) -> FileStatuses {
    let mut statuses = FileStatuses::default();

    for line in output.lines() {
        let mut chars = line.chars();
        let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
            continue;
        };
        let Some(path) = line.get(3..).filter(|p| !p.is_empty()) else {
            continue;
        };

        if index != ' ' && index != '?' {
            statuses.staged.push(path.to_string());
        }
        if worktree != ' ' && worktree != '?' {
            statuses.unstaged.push(path.to_string());
        }
        if index == '?' && worktree == '?' {
            statuses.untracked.push(path.to_string());
        }
    }

    statuses
}

/// Collect staged, unstaged, and untracked paths.
pub async fn collect<P>(port: &P) -> Result<FileStatuses, GitError>
where
    P: VersionControlPort + ?Sized,
{
    let output = port.status_porcelain().await?;
    Ok(parse_porcelain(&output))
}

/// Take a full snapshot of the working copy at `path`.
pub async fn snapshot<P>(port: &P, path: &Path) -> Result<RepositorySnapshot, GitError>
where
    P: VersionControlPort + ?Sized,
{
    probe::ensure_repository(path)?;

    let identity = probe::identity(port).await?;
    let files = collect(port).await?;
    let divergence = divergence(port, &identity.base_branch).await;

    Ok(RepositorySnapshot {
        has_changes: files.has_changes(),
        identity,
        files,
        divergence,
    })
}

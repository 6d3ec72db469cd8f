//! Diff aggregation: file statuses, line counts, and change summaries.
//!
//! Per-file detail comes from name-status listings enriched with a numstat
//! query per path. Aggregate totals come from the human `--stat` listing.
//! The two are deliberately kept separate; see [`parse_stat_summary`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GitError;

use super::port::{DiffTarget, VersionControlPort};

/// Maximum characters for the unified diff text before truncation.
pub const MAX_DIFF_LENGTH: usize = 30_000;

/// Extensions treated as binary. Matched case-insensitively against the
/// end of the path; file contents are never inspected.
const BINARY_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".zip", ".tar", ".gz", ".exe", ".dll", ".so",
    ".dylib", ".bin", ".dat", ".db",
];

/// Status of a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    Untracked,
}

impl FileStatus {
    /// Classify a status code by its leading character.
    ///
    /// Rename and copy similarity scores (`R100`, `C075`) are dropped.
    /// Unrecognised codes are reported as modified and logged.
    pub fn from_code(code: &str) -> Self {
        match code.chars().next() {
            Some('A') => FileStatus::Added,
            Some('M') => FileStatus::Modified,
            Some('D') => FileStatus::Deleted,
            Some('R') => FileStatus::Renamed,
            Some('C') => FileStatus::Copied,
            Some('?') => FileStatus::Untracked,
            _ => {
                warn!("Unrecognised status code {:?}, treating as modified", code);
                FileStatus::Modified
            }
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Deleted => write!(f, "deleted"),
            FileStatus::Renamed => write!(f, "renamed"),
            FileStatus::Copied => write!(f, "copied"),
            FileStatus::Untracked => write!(f, "untracked"),
        }
    }
}

/// A single file's change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub status: FileStatus,
    pub additions: usize,
    pub deletions: usize,
    pub is_binary: bool,
}

/// Aggregate figures from a `--stat` listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSummary {
    pub files: usize,
    pub additions: usize,
    pub deletions: usize,
}

impl StatSummary {
    pub fn lines(&self) -> usize {
        self.additions + self.deletions
    }

    /// Add two summaries together.
    pub fn combine(self, other: StatSummary) -> StatSummary {
        StatSummary {
            files: self.files + other.files,
            additions: self.additions + other.additions,
            deletions: self.deletions + other.deletions,
        }
    }
}

/// Summary of changes between two trees.
///
/// Paths in `files` are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub total_files: usize,
    pub total_lines: usize,
    pub additions: usize,
    pub deletions: usize,
    pub files: Vec<FileChange>,
}

impl ChangeSummary {
    /// Build a summary from stat totals and already merged per-file detail.
    pub fn new(totals: StatSummary, files: Vec<FileChange>) -> Self {
        Self {
            total_files: totals.files,
            total_lines: totals.lines(),
            additions: totals.additions,
            deletions: totals.deletions,
            files,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.total_files == 0
    }

    /// Totals summed from per-file detail instead of the stat listing.
    ///
    /// These are exact, whereas the aggregate fields are capped by the
    /// width of the stat bar on large diffs.
    pub fn detail_totals(&self) -> StatSummary {
        self.files.iter().fold(StatSummary::default(), |acc, f| StatSummary {
            files: acc.files + 1,
            additions: acc.additions + f.additions,
            deletions: acc.deletions + f.deletions,
        })
    }
}

/// Unified patch text, possibly truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchText {
    pub text: String,
    pub truncated: bool,
}

/// Check whether a path looks binary by its extension.
pub fn is_binary_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// One line of a name-status listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameStatusEntry {
    pub status: FileStatus,
    /// Destination path; the key of the resulting [`FileChange`].
    pub path: String,
    /// Source path of a rename or copy.
    pub source: Option<String>,
}

impl NameStatusEntry {
    /// Paths to pass to a numstat query, source first.
    pub fn numstat_paths(&self) -> Vec<String> {
        self.source
            .iter()
            .chain(std::iter::once(&self.path))
            .cloned()
            .collect()
    }
}

/// Parse a name-status listing.
///
/// Fields are tab separated; input without tabs is split on whitespace.
/// Renames and copies are keyed by their destination path.
pub fn parse_name_status(output: &str) -> Vec<NameStatusEntry> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let fields: Vec<&str> = if line.contains('\t') {
                line.split('\t').collect()
            } else {
                line.split_whitespace().collect()
            };
            match fields.as_slice() {
                [code, middle @ .., path] if !path.is_empty() => Some(NameStatusEntry {
                    status: FileStatus::from_code(code),
                    path: path.to_string(),
                    source: middle.first().map(|s| s.to_string()),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Parse the first numstat line into `(additions, deletions)`.
///
/// Binary files report `-` for both counts and yield `None`.
pub fn parse_numstat(output: &str) -> Option<(usize, usize)> {
    let line = output.lines().find(|l| !l.trim().is_empty())?;
    let mut fields = line.split_whitespace();
    let additions = fields.next()?.parse().ok()?;
    let deletions = fields.next()?.parse().ok()?;
    Some((additions, deletions))
}

/// Get addition/deletion counts for one change.
///
/// `paths` holds the destination path, preceded by the source path for a
/// rename or copy. Failures degrade to `(0, 0)`: these counts decorate a
/// change, they never decide whether it exists.
pub async fn file_stat<P>(port: &P, target: &DiffTarget, paths: &[String]) -> (usize, usize)
where
    P: VersionControlPort + ?Sized,
{
    let shown = paths.join(" -> ");
    match port.diff_numstat(target, paths).await {
        Ok(output) => parse_numstat(&output).unwrap_or_else(|| {
            debug!("No numeric stats for {} ({})", shown, target);
            (0, 0)
        }),
        Err(e) => {
            warn!("Failed to get stats for {} ({}): {}", shown, target, e);
            (0, 0)
        }
    }
}

/// Turn a raw name-status listing into enriched file changes.
pub async fn name_status<P>(port: &P, target: &DiffTarget, raw: &str) -> Vec<FileChange>
where
    P: VersionControlPort + ?Sized,
{
    let mut changes = Vec::new();

    for entry in parse_name_status(raw) {
        let (additions, deletions) = file_stat(port, target, &entry.numstat_paths()).await;
        changes.push(FileChange {
            is_binary: is_binary_path(&entry.path),
            path: entry.path,
            status: entry.status,
            additions,
            deletions,
        });
    }

    changes
}

/// Collapse repeated entries for the same path.
///
/// Counts are summed and binary flags OR-ed. The status of the last
/// occurrence wins, so callers must pass staged entries before unstaged
/// ones: an unstaged status then supersedes the staged one. Output keeps
/// the order in which paths were first seen.
pub fn merge_overlapping(changes: Vec<FileChange>) -> Vec<FileChange> {
    let mut merged: Vec<FileChange> = Vec::with_capacity(changes.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for change in changes {
        match positions.get(&change.path) {
            Some(&i) => {
                let existing = &mut merged[i];
                existing.additions += change.additions;
                existing.deletions += change.deletions;
                existing.is_binary |= change.is_binary;
                existing.status = change.status;
            }
            None => {
                positions.insert(change.path.clone(), merged.len());
                merged.push(change);
            }
        }
    }

    merged
}

/// Parse the human `path | N +++--` listing into totals.
///
/// Additions and deletions are the number of `+` and `-` glyphs in the bar,
/// not the numeric count beside it. Git scales the bar to the terminal
/// width, so on large diffs these totals undercount. Kept for parity with
/// existing consumers; [`ChangeSummary::detail_totals`] gives exact sums.
/// `Bin` lines count as a file with no glyphs.
pub fn parse_stat_summary(output: &str) -> StatSummary {
    let mut summary = StatSummary::default();

    for line in output.lines() {
        let Some((path, stats)) = line.rsplit_once('|') else {
            continue;
        };
        if path.trim().is_empty() {
            continue;
        }
        summary.files += 1;

        let mut tokens = stats.split_whitespace();
        let Some(count) = tokens.next() else {
            continue;
        };
        if count.parse::<usize>().is_err() {
            continue;
        }
        for bar in tokens {
            summary.additions += bar.matches('+').count();
            summary.deletions += bar.matches('-').count();
        }
    }

    summary
}

/// Summarize staged and unstaged changes in the working tree.
///
/// Untracked files are not part of any diff and are reported by the status
/// collector instead.
pub async fn working_tree_summary<P>(port: &P) -> Result<ChangeSummary, GitError>
where
    P: VersionControlPort + ?Sized,
{
    let staged_stat = parse_stat_summary(&port.diff_stat(&DiffTarget::Staged).await?);
    let unstaged_stat = parse_stat_summary(&port.diff_stat(&DiffTarget::Unstaged).await?);

    let staged_raw = port.diff_name_status(&DiffTarget::Staged).await?;
    let unstaged_raw = port.diff_name_status(&DiffTarget::Unstaged).await?;

    // Staged first: unstaged status wins on merge.
    let mut changes = name_status(port, &DiffTarget::Staged, &staged_raw).await;
    changes.extend(name_status(port, &DiffTarget::Unstaged, &unstaged_raw).await);

    Ok(ChangeSummary::new(
        staged_stat.combine(unstaged_stat),
        merge_overlapping(changes),
    ))
}

/// Truncate patch text to at most `max_len` bytes on a line boundary.
pub fn truncate_patch(raw: &str, max_len: usize) -> PatchText {
    if raw.len() <= max_len {
        return PatchText {
            text: raw.to_string(),
            truncated: false,
        };
    }

    let mut text = String::with_capacity(max_len);
    for line in raw.split_inclusive('\n') {
        if text.len() + line.len() > max_len {
            break;
        }
        text.push_str(line);
    }

    PatchText {
        text,
        truncated: true,
    }
}

/// Fetch the unified patch for a target, truncated for prompt use.
pub async fn patch<P>(port: &P, target: &DiffTarget) -> Result<PatchText, GitError>
where
    P: VersionControlPort + ?Sized,
{
    let raw = port.diff_patch(target).await?;
    Ok(truncate_patch(&raw, MAX_DIFF_LENGTH))
}

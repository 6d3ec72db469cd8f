//! Commit history: log parsing, commits ahead of a base, divergence counts.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GitError;

use super::cli::LOG_FIELD_SEPARATOR;
use super::port::{LogQuery, VersionControlPort};
use super::probe::resolve_base_ref;

/// Number of commits returned by [`history`] when no positive limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// A commit and the paths it touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
    pub files: Vec<String>,
}

impl CommitRecord {
    /// First eight characters of the hash.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }
}

/// How far HEAD has moved relative to a base branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    pub ahead: usize,
    pub behind: usize,
}

/// Parse log output into commit records.
///
/// A line containing the field separator opens a new commit; every other
/// non-blank line is a path belonging to the most recently opened commit.
/// Paths seen before any header are ignored.
pub fn parse_log(output: &str) -> Result<Vec<CommitRecord>, GitError> {
    let mut commits: Vec<CommitRecord> = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains(LOG_FIELD_SEPARATOR) {
            commits.push(parse_header(line)?);
        } else if let Some(current) = commits.last_mut() {
            current.files.push(line.to_string());
        }
    }

    Ok(commits)
}

/// Parse `hash<US>subject<US>author<US>email<US>timestamp`.
fn parse_header(line: &str) -> Result<CommitRecord, GitError> {
    let parts: Vec<&str> = line.split(LOG_FIELD_SEPARATOR).collect();
    let [hash, message, author, email, seconds] = parts[..] else {
        return Err(GitError::Parse(format!(
            "commit header has {} fields, expected 5: {:?}",
            parts.len(),
            line
        )));
    };

    Ok(CommitRecord {
        hash: hash.to_string(),
        message: message.to_string(),
        author: author.to_string(),
        email: email.to_string(),
        timestamp: parse_timestamp(hash, seconds),
        files: Vec::new(),
    })
}

/// Parse a unix timestamp, degrading to the current time.
fn parse_timestamp(hash: &str, seconds: &str) -> DateTime<Utc> {
    seconds
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .unwrap_or_else(|| {
            warn!("Commit {} has invalid timestamp {:?}, using now", hash, seconds);
            Utc::now()
        })
}

/// Fetch up to `limit` most recent commits (10 when `limit` is 0).
///
/// A branch with no commits yet has an empty history.
pub async fn history<P>(port: &P, limit: usize) -> Result<Vec<CommitRecord>, GitError>
where
    P: VersionControlPort + ?Sized,
{
    if !port.verify_revision("HEAD").await? {
        debug!("HEAD does not point at a commit yet");
        return Ok(Vec::new());
    }

    let limit = if limit == 0 { DEFAULT_HISTORY_LIMIT } else { limit };
    let query = LogQuery {
        range: None,
        limit: Some(limit),
    };
    let output = port.log(&query).await?;
    parse_log(&output)
}

/// Fetch commits reachable from HEAD but not from the base branch.
///
/// No commits ahead is an empty list, not an error.
pub async fn commits_since<P>(port: &P, base: &str) -> Result<Vec<CommitRecord>, GitError>
where
    P: VersionControlPort + ?Sized,
{
    let base_ref = resolve_base_ref(port, base).await?;
    let query = LogQuery {
        range: Some(format!("{}..HEAD", base_ref)),
        limit: None,
    };

    let output = port.log(&query).await?;
    if output.trim().is_empty() {
        debug!("No commits ahead of {}", base_ref);
        return Ok(Vec::new());
    }

    parse_log(&output)
}

/// Count commits ahead of and behind the base branch.
///
/// Returns `None` when the base cannot be resolved; unparseable counts
/// degrade to zero.
pub async fn divergence<P>(port: &P, base: &str) -> Option<Divergence>
where
    P: VersionControlPort + ?Sized,
{
    let base_ref = match resolve_base_ref(port, base).await {
        Ok(r) => r,
        Err(e) => {
            debug!("Skipping divergence: {}", e);
            return None;
        }
    };

    Some(Divergence {
        ahead: count_commits(port, &format!("{}..HEAD", base_ref)).await,
        behind: count_commits(port, &format!("HEAD..{}", base_ref)).await,
    })
}

async fn count_commits<P>(port: &P, range: &str) -> usize
where
    P: VersionControlPort + ?Sized,
{
    match port.rev_list_count(range).await {
        Ok(out) => out.trim().parse().unwrap_or_else(|_| {
            warn!("Unexpected rev-list count for {}: {:?}", range, out);
            0
        }),
        Err(e) => {
            warn!("Failed to count commits in {}: {}", range, e);
            0
        }
    }
}

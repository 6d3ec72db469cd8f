//! Branch comparison against a base branch.

use tracing::debug;

use crate::error::GitError;

use super::diff::{ChangeSummary, merge_overlapping, name_status, parse_stat_summary};
use super::port::{DiffTarget, VersionControlPort};
use super::probe::resolve_base_ref;

/// Compare HEAD against `base` relative to their merge base.
///
/// The base is resolved like [`commits_since`](super::history::commits_since):
/// remote-tracking ref first, then the local branch. Using a three-dot range
/// leaves out changes that landed on the base after the branch point.
pub async fn compare<P>(port: &P, base: &str) -> Result<ChangeSummary, GitError>
where
    P: VersionControlPort + ?Sized,
{
    let base_ref = resolve_base_ref(port, base).await?;
    let target = DiffTarget::three_dot(&base_ref);
    debug!("Comparing {}", target);

    compare_target(port, &target).await
}

/// Build a summary for an already resolved diff target.
pub async fn compare_target<P>(port: &P, target: &DiffTarget) -> Result<ChangeSummary, GitError>
where
    P: VersionControlPort + ?Sized,
{
    let totals = parse_stat_summary(&port.diff_stat(target).await?);
    let raw = port.diff_name_status(target).await?;
    let files = merge_overlapping(name_status(port, target, &raw).await);

    Ok(ChangeSummary::new(totals, files))
}

//! Change analysis over a git working copy.
//!
//! Data flows upward: the probe feeds the status collector and history
//! reader, those feed the diff aggregator, and the branch comparator
//! composes them. Every query goes through [`VersionControlPort`].

pub mod cli;
pub mod compare;
pub mod diff;
pub mod history;
pub mod port;
pub mod probe;
pub mod remote;
pub mod status;

pub use cli::{GitCli, check_git_installed};
pub use compare::compare;
pub use diff::{ChangeSummary, FileChange, FileStatus, StatSummary, working_tree_summary};
pub use history::{CommitRecord, Divergence, commits_since, history};
pub use port::{DiffTarget, LogQuery, VersionControlPort};
pub use probe::{RepositoryIdentity, is_repository};
pub use remote::{Platform, RemoteLocation};
pub use status::{FileStatuses, RepositorySnapshot};

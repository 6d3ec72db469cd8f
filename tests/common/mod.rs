//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use git2::{Oid, Repository, Signature, build::CheckoutBuilder};

use auto_pr::git::{DiffTarget, GitCli, LogQuery, VersionControlPort};
use auto_pr::GitError;

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Adapter pointed at this repository.
    pub fn git(&self) -> GitCli {
        GitCli::new(self.dir.path()).with_timeout(Duration::from_secs(30))
    }

    /// Get the test signature for commits.
    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write a file in the working tree, creating parent directories.
    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Add a path to the index.
    pub fn stage(&self, rel: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(rel)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Write, stage, and commit files on HEAD. Returns the commit OID.
    pub fn commit_files(&self, files: &[(&str, &str)], message: &str) -> Oid {
        for (rel, content) in files {
            self.write(rel, content);
            self.stage(rel);
        }
        self.commit_index(message)
    }

    /// Commit whatever is in the index.
    pub fn commit_index(&self, message: &str) -> Oid {
        let sig = self.signature();
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        // Get parent commit if exists
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Move a file in the working tree and the index, like `git mv`.
    pub fn rename(&self, from: &str, to: &str) {
        let target = self.dir.path().join(to);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::rename(self.dir.path().join(from), target).expect("Failed to rename file");

        let mut index = self.repo.index().expect("Failed to get index");
        index.remove_path(Path::new(from)).expect("Failed to remove file");
        index.add_path(Path::new(to)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Create a branch pointing to the given OID.
    pub fn branch(&self, name: &str, oid: Oid) {
        let commit = self.repo.find_commit(oid).expect("Failed to find commit");
        self.repo.branch(name, &commit, true).expect("Failed to create branch");
    }

    /// Switch HEAD to an existing branch and update the working tree.
    pub fn checkout(&self, name: &str) {
        self.repo
            .set_head(&format!("refs/heads/{}", name))
            .expect("Failed to set HEAD");
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))
            .expect("Failed to checkout HEAD");
    }

    /// Create a branch at HEAD and switch to it.
    pub fn checkout_new(&self, name: &str) {
        let head = self.head();
        self.branch(name, head);
        self.checkout(name);
    }

    pub fn head(&self) -> Oid {
        self.repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map(|c| c.id())
            .expect("Failed to resolve HEAD")
    }

    /// Name of the checked-out branch as git2 sees it.
    pub fn current_branch(&self) -> String {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(String::from))
            .expect("HEAD has no branch")
    }

    /// Create `refs/remotes/origin/<branch>` without a real remote.
    pub fn remote_tracking(&self, branch: &str, oid: Oid) {
        self.repo
            .reference(&format!("refs/remotes/origin/{}", branch), oid, true, "test")
            .expect("Failed to create remote-tracking ref");
    }

    /// Point `refs/remotes/origin/HEAD` at `origin/<branch>`.
    pub fn remote_head(&self, branch: &str) {
        self.repo
            .reference_symbolic(
                "refs/remotes/origin/HEAD",
                &format!("refs/remotes/origin/{}", branch),
                true,
                "test",
            )
            .expect("Failed to create remote HEAD");
    }

    pub fn add_origin(&self, url: &str) {
        self.repo.remote("origin", url).expect("Failed to add remote");
    }
}

/// In-memory port that replays canned query output.
///
/// Diff output is keyed by the target's display form (`staged`, `unstaged`,
/// or the range); numstat additionally by its space-joined paths.
/// Unscripted diffs are empty.
#[derive(Default)]
pub struct ScriptedPort {
    pub branch: String,
    pub remote: Option<String>,
    pub revisions: Vec<String>,
    pub status: String,
    pub log: String,
    pub name_status: HashMap<String, String>,
    pub stat: HashMap<String, String>,
    pub numstat: HashMap<(String, String), String>,
}

impl ScriptedPort {
    pub fn name_status(mut self, target: &DiffTarget, output: &str) -> Self {
        self.name_status.insert(target.to_string(), output.to_string());
        self
    }

    pub fn stat(mut self, target: &DiffTarget, output: &str) -> Self {
        self.stat.insert(target.to_string(), output.to_string());
        self
    }

    pub fn numstat(mut self, target: &DiffTarget, paths: &str, output: &str) -> Self {
        self.numstat
            .insert((target.to_string(), paths.to_string()), output.to_string());
        self
    }
}

#[async_trait]
impl VersionControlPort for ScriptedPort {
    async fn current_branch(&self) -> Result<String, GitError> {
        Ok(self.branch.clone())
    }

    async fn remote_url(&self, _remote: &str) -> Result<Option<String>, GitError> {
        Ok(self.remote.clone())
    }

    async fn symbolic_ref(&self, _name: &str) -> Result<Option<String>, GitError> {
        Ok(None)
    }

    async fn ref_exists(&self, full_ref: &str) -> Result<bool, GitError> {
        Ok(self
            .revisions
            .iter()
            .any(|r| full_ref == format!("refs/remotes/{}", r)))
    }

    async fn verify_revision(&self, revision: &str) -> Result<bool, GitError> {
        Ok(self.revisions.iter().any(|r| r == revision))
    }

    async fn status_porcelain(&self) -> Result<String, GitError> {
        Ok(self.status.clone())
    }

    async fn log(&self, _query: &LogQuery) -> Result<String, GitError> {
        Ok(self.log.clone())
    }

    async fn rev_list_count(&self, _range: &str) -> Result<String, GitError> {
        Ok("0\n".to_string())
    }

    async fn diff_name_status(&self, target: &DiffTarget) -> Result<String, GitError> {
        Ok(self.name_status.get(&target.to_string()).cloned().unwrap_or_default())
    }

    async fn diff_numstat(
        &self,
        target: &DiffTarget,
        paths: &[String],
    ) -> Result<String, GitError> {
        let key = paths.join(" ");
        self.numstat
            .get(&(target.to_string(), key.clone()))
            .cloned()
            .ok_or_else(|| GitError::QueryFailed {
                command: "diff".to_string(),
                stderr: format!("no numstat scripted for {}", key),
            })
    }

    async fn diff_stat(&self, target: &DiffTarget) -> Result<String, GitError> {
        Ok(self.stat.get(&target.to_string()).cloned().unwrap_or_default())
    }

    async fn diff_patch(&self, _target: &DiffTarget) -> Result<String, GitError> {
        Ok(String::new())
    }
}

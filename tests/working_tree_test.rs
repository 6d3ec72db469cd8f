//! Integration tests for working tree status and change summaries.

mod common;

use std::path::Path;

use auto_pr::git::status::{collect, snapshot};
use auto_pr::git::{FileStatus, working_tree_summary};
use common::TestRepo;

#[tokio::test]
async fn test_collect_partitions_paths() {
    let test_repo = TestRepo::new();
    test_repo.commit_files(
        &[("staged.txt", "one\n"), ("unstaged.txt", "one\n"), ("both.txt", "one\n")],
        "init",
    );

    test_repo.write("staged.txt", "two\n");
    test_repo.stage("staged.txt");
    test_repo.write("unstaged.txt", "two!\n");
    test_repo.write("both.txt", "two\n");
    test_repo.stage("both.txt");
    test_repo.write("both.txt", "three\n");
    test_repo.write("notes.txt", "scratch\n");

    let files = collect(&test_repo.git()).await.unwrap();

    assert_eq!(files.staged, vec!["both.txt", "staged.txt"]);
    assert_eq!(files.unstaged, vec!["both.txt", "unstaged.txt"]);
    assert_eq!(files.untracked, vec!["notes.txt"]);
    assert!(files.has_changes());
}

#[tokio::test]
async fn test_clean_tree_has_no_changes() {
    let test_repo = TestRepo::new();
    test_repo.commit_files(&[("README.md", "# demo\n")], "init");

    let files = collect(&test_repo.git()).await.unwrap();
    assert!(!files.has_changes());

    let summary = working_tree_summary(&test_repo.git()).await.unwrap();
    assert!(summary.is_empty());
    assert_eq!(summary.total_lines, 0);
}

#[tokio::test]
async fn test_snapshot_reports_divergence_when_base_resolves() {
    let test_repo = TestRepo::new();
    let base = test_repo.commit_files(&[("README.md", "# demo\n")], "init");
    test_repo.remote_tracking("main", base);
    test_repo.checkout_new("feature/x");
    test_repo.commit_files(&[("x.rs", "fn x() {}\n")], "feat: x");
    test_repo.write("scratch.txt", "tmp\n");

    let git = test_repo.git();
    let snap = snapshot(&git, test_repo.path()).await.unwrap();

    assert_eq!(snap.identity.current_branch, "feature/x");
    assert_eq!(snap.identity.base_branch, "main");
    assert!(snap.has_changes);
    assert_eq!(snap.files.untracked, vec!["scratch.txt"]);

    let divergence = snap.divergence.expect("base should resolve");
    assert_eq!(divergence.ahead, 1);
    assert_eq!(divergence.behind, 0);
}

#[tokio::test]
async fn test_summary_merges_staged_and_unstaged_edits() {
    let test_repo = TestRepo::new();
    test_repo.commit_files(&[("app.rs", "one\n")], "init");

    test_repo.write("app.rs", "two\n");
    test_repo.stage("app.rs");
    test_repo.write("app.rs", "three\n");

    let summary = working_tree_summary(&test_repo.git()).await.unwrap();

    assert_eq!(summary.files.len(), 1);
    let file = &summary.files[0];
    assert_eq!(file.path, "app.rs");
    assert_eq!(file.status, FileStatus::Modified);
    assert_eq!((file.additions, file.deletions), (2, 2));

    // Stat totals are summed across both diffs, detail totals per path.
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.detail_totals().files, 1);
}

#[tokio::test]
async fn test_unstaged_status_wins_over_staged_add() {
    let test_repo = TestRepo::new();
    test_repo.commit_files(&[("README.md", "# demo\n")], "init");

    test_repo.write("new.rs", "a\nb\nc\n");
    test_repo.stage("new.rs");
    test_repo.write("new.rs", "a\nb\nc\nd\n");

    let summary = working_tree_summary(&test_repo.git()).await.unwrap();

    let file = summary.files.iter().find(|f| f.path == "new.rs").unwrap();
    assert_eq!(file.status, FileStatus::Modified);
    assert_eq!(file.additions, 4);
    assert_eq!(file.deletions, 0);
}

#[tokio::test]
async fn test_summary_reports_deletions_and_binaries() {
    let test_repo = TestRepo::new();
    test_repo.commit_files(&[("old.txt", "a\nb\n"), ("keep.txt", "k\n")], "init");

    let mut index = test_repo.repo.index().unwrap();
    index.remove_path(Path::new("old.txt")).unwrap();
    index.write().unwrap();
    std::fs::remove_file(test_repo.path().join("old.txt")).unwrap();

    test_repo.write("logo.png", [0x89u8, b'P', b'N', b'G', 0, 0, 1, 2]);
    test_repo.stage("logo.png");

    let summary = working_tree_summary(&test_repo.git()).await.unwrap();

    let old = summary.files.iter().find(|f| f.path == "old.txt").unwrap();
    assert_eq!(old.status, FileStatus::Deleted);
    assert_eq!((old.additions, old.deletions), (0, 2));
    assert!(!old.is_binary);

    let logo = summary.files.iter().find(|f| f.path == "logo.png").unwrap();
    assert_eq!(logo.status, FileStatus::Added);
    assert_eq!((logo.additions, logo.deletions), (0, 0));
    assert!(logo.is_binary);

    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.deletions, 2);
}

#[tokio::test]
async fn test_untracked_files_are_not_in_summary() {
    let test_repo = TestRepo::new();
    test_repo.commit_files(&[("README.md", "# demo\n")], "init");
    test_repo.write("draft.md", "wip\n");

    let summary = working_tree_summary(&test_repo.git()).await.unwrap();
    assert!(summary.is_empty());
}

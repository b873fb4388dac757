#![forbid(unsafe_code)]

use dm_core::ids::{BranchName, RepoId};
use dm_vcs::{GitConfig, GitError, GitGateway};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn bare_remote(dir: &Path) -> String {
    let status = Command::new("git")
        .args(["init", "--quiet", "--bare"])
        .arg(dir)
        .status()
        .expect("spawn git init --bare");
    assert!(status.success(), "git init --bare failed");
    dir.to_string_lossy().into_owned()
}

fn gateway(root: &Path) -> GitGateway {
    GitGateway::new(root.join("repos"), GitConfig::default())
}

fn branch(name: &str) -> BranchName {
    BranchName::try_new(name).expect("branch name")
}

#[test]
fn commit_is_skipped_when_clean() {
    let root = TempDir::new().expect("temp dir");
    let git = gateway(root.path());
    let repo = RepoId::new(1);
    let wc = git.lease(repo);

    assert!(!wc.exists());
    assert!(wc.ensure_initialized().expect("init"));
    assert!(!wc.ensure_initialized().expect("init again"));
    assert_eq!(wc.current_branch().as_deref(), Some("main"));

    fs::write(wc.path().join("README.md"), "# Handbook\n").expect("write");
    wc.stage_all().expect("stage");
    let first = wc.commit_if_dirty("repo-1/u1/alice").expect("commit");
    assert!(first.is_some());

    wc.stage_all().expect("stage again");
    assert_eq!(wc.commit_if_dirty("repo-1/u1/alice").expect("commit again"), None);

    let status = wc.status(&BranchName::main(), None);
    assert!(status.has_local_repo);
    assert!(status.has_local_branch);
    assert_eq!(status.local_commit_count, 1);
    assert!(!status.is_dirty);
    assert!(!status.has_remote);
    let last = status.last_commit.expect("last commit");
    assert_eq!(Some(last.hash), first);
    assert_eq!(last.message, "repo-1/u1/alice");
}

#[test]
fn status_without_working_copy_is_empty() {
    let root = TempDir::new().expect("temp dir");
    let git = gateway(root.path());
    let wc = git.lease(RepoId::new(7));
    let status = wc.status(&branch("exp"), Some("/nonexistent/remote.git"));
    assert!(!status.has_local_repo);
    assert!(!status.has_local_branch);
    assert_eq!(status.ahead, 0);
}

#[test]
fn push_then_track_ahead_behind() {
    let root = TempDir::new().expect("temp dir");
    let remote_dir = TempDir::new().expect("remote dir");
    let remote = bare_remote(remote_dir.path());
    let git = gateway(root.path());
    let wc = git.lease(RepoId::new(1));
    let exp = branch("exp");

    wc.ensure_initialized().expect("init");
    fs::write(wc.path().join("README.md"), "root").expect("write");
    wc.stage_all().expect("stage");
    wc.commit_if_dirty("main commit").expect("commit main");
    wc.branch_from(&exp, &BranchName::main()).expect("branch from main");
    wc.checkout(&exp).expect("checkout exp");
    assert_eq!(wc.current_branch().as_deref(), Some("exp"));

    let before = wc.status(&exp, Some(&remote));
    assert!(before.has_remote);
    assert!(!before.has_remote_branch);
    assert_eq!(before.ahead, before.local_commit_count);

    wc.set_remote(&remote).expect("set remote");
    assert!(wc.push(&exp).expect("first push"));

    let synced = wc.status(&exp, Some(&remote));
    assert!(synced.has_remote_branch);
    assert_eq!((synced.ahead, synced.behind), (0, 0));
    assert_eq!(synced.remote_commit_count, synced.local_commit_count);

    fs::create_dir_all(wc.path().join("Doc")).expect("doc dir");
    fs::write(wc.path().join("Doc/block.md"), "text").expect("block");
    wc.stage_all().expect("stage");
    wc.commit_if_dirty("second").expect("commit");

    let ahead = wc.status(&exp, Some(&remote));
    assert_eq!((ahead.ahead, ahead.behind), (1, 0));

    assert!(!wc.push(&exp).expect("second push"));
    let synced = wc.status(&exp, Some(&remote));
    assert_eq!((synced.ahead, synced.behind), (0, 0));
}

#[test]
fn pull_reset_tracks_remote_branch() {
    let remote_dir = TempDir::new().expect("remote dir");
    let remote = bare_remote(remote_dir.path());
    let exp = branch("exp");

    let origin_root = TempDir::new().expect("origin root");
    let origin = gateway(origin_root.path());
    {
        let wc = origin.lease(RepoId::new(1));
        wc.ensure_initialized().expect("init");
        wc.checkout(&exp).expect("checkout");
        fs::create_dir_all(wc.path().join("Shared")).expect("dir");
        fs::write(wc.path().join("Shared/README.md"), "from origin").expect("write");
        wc.stage_all().expect("stage");
        wc.commit_if_dirty("seed").expect("commit");
        wc.set_remote(&remote).expect("remote");
        wc.push(&exp).expect("push");
    }

    let clone_root = TempDir::new().expect("clone root");
    let clone = gateway(clone_root.path());
    let wc = clone.lease(RepoId::new(1));
    wc.ensure_initialized().expect("init clone");
    wc.set_remote(&remote).expect("remote");
    wc.pull_reset(&exp).expect("pull");

    assert_eq!(wc.current_branch().as_deref(), Some("exp"));
    assert_eq!(
        fs::read_to_string(wc.path().join("Shared/README.md")).expect("pulled file"),
        "from origin"
    );

    {
        let origin_wc = origin.lease(RepoId::new(1));
        fs::write(origin_wc.path().join("Shared/extra.md"), "more").expect("write");
        origin_wc.stage_all().expect("stage");
        origin_wc.commit_if_dirty("more").expect("commit");
        origin_wc.push(&exp).expect("push");
    }
    let behind = wc.status(&exp, Some(&remote));
    assert_eq!((behind.ahead, behind.behind), (0, 1));

    wc.pull_fast_forward(&exp).expect("fast-forward");
    assert!(wc.path().join("Shared/extra.md").exists());
}

#[test]
fn verify_remote_lists_branches() {
    let remote_dir = TempDir::new().expect("remote dir");
    let remote = bare_remote(remote_dir.path());
    let root = TempDir::new().expect("root");
    let git = gateway(root.path());

    let empty = git.verify_remote(&remote).expect("verify empty remote");
    assert!(empty.branches.is_empty());

    {
        let wc = git.lease(RepoId::new(3));
        wc.ensure_initialized().expect("init");
        fs::write(wc.path().join("README.md"), "x").expect("write");
        wc.stage_all().expect("stage");
        wc.commit_if_dirty("init").expect("commit");
        wc.set_remote(&remote).expect("remote");
        wc.push(&BranchName::main()).expect("push");
    }
    let info = git.verify_remote(&remote).expect("verify");
    assert_eq!(info.branches, vec!["main".to_string()]);

    let missing = root.path().join("no-such-remote.git");
    let err = git
        .verify_remote(&missing.to_string_lossy())
        .expect_err("unreachable remote");
    assert!(matches!(err, GitError::Failed { .. }));
}

#[test]
fn leases_on_different_repositories_do_not_contend() {
    let root = TempDir::new().expect("root");
    let git = gateway(root.path());
    let a = git.lease(RepoId::new(1));
    let b = git.lease(RepoId::new(2));
    assert_ne!(a.path(), b.path());
    drop(a);
    let again = git.lease(RepoId::new(1));
    assert_eq!(again.repo(), RepoId::new(1));
}

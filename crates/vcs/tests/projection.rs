#![forbid(unsafe_code)]

use dm_core::ids::{BranchName, RepoId};
use dm_core::model::{Block, BranchSnapshot, DisplayMode, Doc, Repository};
use dm_vcs::{import_tree, project, replace_contents};
use std::fs;
use tempfile::TempDir;

fn repository(description: &str) -> Repository {
    Repository {
        id: RepoId::new(1),
        title: "Handbook".to_string(),
        description: description.to_string(),
        current_branch: BranchName::main(),
        branches: vec![BranchName::main()],
        remote_url: None,
        display_mode: DisplayMode::Tree,
        created_at_ms: 0,
    }
}

fn doc(id: i64, parent_id: Option<i64>, title: &str, body: &str, order: i64) -> Doc {
    Doc {
        id,
        repo_id: RepoId::new(1),
        branch: BranchName::main(),
        parent_id,
        title: title.to_string(),
        body: body.to_string(),
        order,
        path: String::new(),
        updated_at_ms: 0,
    }
}

fn block(id: i64, doc_id: i64, title: &str, body: &str) -> Block {
    Block {
        id,
        repo_id: RepoId::new(1),
        branch: BranchName::main(),
        doc_id,
        title: title.to_string(),
        body: body.to_string(),
        order: 0,
        updated_at_ms: 0,
    }
}

fn snapshot(description: &str, docs: Vec<Doc>, blocks: Vec<Block>) -> BranchSnapshot {
    BranchSnapshot {
        repository: repository(description),
        branch: BranchName::main(),
        docs,
        blocks,
    }
}

#[test]
fn projects_docs_blocks_and_markers() {
    let dir = TempDir::new().expect("temp dir");
    let snap = snapshot(
        "",
        vec![
            doc(1, None, "Guide", "intro", 0),
            doc(2, Some(1), "Setup: step 1", "", 0),
            doc(3, None, "Empty", "", 1),
            doc(4, Some(99), "Detached", "x", 2),
        ],
        vec![block(10, 2, "install", "cargo build\n"), block(11, 404, "lost", "")],
    );

    let report = project(&snap, dir.path()).expect("project");
    assert_eq!(report.docs, 4);
    assert_eq!(report.blocks, 1);
    assert_eq!(report.skipped_blocks, 1);

    let root = dir.path();
    assert_eq!(
        fs::read_to_string(root.join("README.md")).expect("root marker"),
        "# Handbook\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("Guide/README.md")).expect("doc body"),
        "intro"
    );
    assert_eq!(
        fs::read_to_string(root.join("Guide/Setup_ step 1/install.md")).expect("block"),
        "cargo build\n"
    );
    assert!(!root.join("Guide/Setup_ step 1/README.md").exists());
    assert!(root.join("Empty/.gitkeep").exists());
    assert!(root.join("Detached/README.md").exists());
}

#[test]
fn description_becomes_root_marker() {
    let dir = TempDir::new().expect("temp dir");
    project(&snapshot("About this repo", Vec::new(), Vec::new()), dir.path()).expect("project");
    assert_eq!(
        fs::read_to_string(dir.path().join("README.md")).expect("root marker"),
        "About this repo"
    );
}

#[test]
fn doc_body_wins_over_block_named_like_the_marker() {
    let dir = TempDir::new().expect("temp dir");
    let snap = snapshot(
        "",
        vec![doc(1, None, "Guide", "guide body", 0)],
        vec![block(5, 1, "README", "block text"), block(6, 1, "usage", "run it")],
    );
    project(&snap, dir.path()).expect("project");
    assert_eq!(
        fs::read_to_string(dir.path().join("Guide/README.md")).expect("doc body"),
        "guide body"
    );

    let tree = import_tree(dir.path()).expect("import");
    assert_eq!(tree.docs.len(), 1);
    assert_eq!(tree.docs[0].body, "guide body");
    let titles: Vec<&str> = tree.blocks.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["usage"]);
}

#[test]
fn import_round_trips_projection() {
    let dir = TempDir::new().expect("temp dir");
    let snap = snapshot(
        "desc",
        vec![
            doc(1, None, "b-doc", "body b", 1),
            doc(2, None, "a-doc", "", 0),
            doc(3, Some(2), "child", "nested", 0),
            doc(4, Some(3), "leaf", "", 0),
        ],
        vec![block(7, 2, "notes", "n1"), block(8, 2, "todo", "t1")],
    );
    project(&snap, dir.path()).expect("project");
    fs::create_dir_all(dir.path().join(".git/objects")).expect("fake git dir");
    fs::write(dir.path().join(".hidden"), "skip").expect("hidden file");

    let tree = import_tree(dir.path()).expect("import");
    let titles: Vec<&str> = tree.docs.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["a-doc", "b-doc", "child", "leaf"]);

    let a = &tree.docs[0];
    assert_eq!((a.parent, a.body.as_str(), a.order), (None, "", 0));
    let b = &tree.docs[1];
    assert_eq!((b.parent, b.body.as_str(), b.order), (None, "body b", 1));
    assert_eq!(tree.docs[2].parent, Some(0));
    assert_eq!(tree.docs[2].body, "nested");
    assert_eq!(tree.docs[3].parent, Some(2));

    let blocks: Vec<(usize, &str, &str, i64)> = tree
        .blocks
        .iter()
        .map(|b| (b.doc, b.title.as_str(), b.body.as_str(), b.order))
        .collect();
    assert_eq!(blocks, vec![(0, "notes", "n1", 0), (0, "todo", "t1", 1)]);

    for (index, doc) in tree.docs.iter().enumerate() {
        if let Some(parent) = doc.parent {
            assert!(parent < index, "parent precedes child");
        }
    }
}

#[test]
fn replace_contents_keeps_git_dir() {
    let source = TempDir::new().expect("source");
    let target = TempDir::new().expect("target");
    fs::create_dir_all(source.path().join("Doc")).expect("doc dir");
    fs::write(source.path().join("Doc/block.md"), "new").expect("block");

    fs::create_dir_all(target.path().join(".git")).expect("git dir");
    fs::write(target.path().join(".git/HEAD"), "ref: refs/heads/main").expect("head");
    fs::create_dir_all(target.path().join("Stale")).expect("stale dir");
    fs::write(target.path().join("stale.md"), "old").expect("stale file");

    replace_contents(source.path(), target.path()).expect("replace");
    assert!(target.path().join(".git/HEAD").exists());
    assert!(!target.path().join("Stale").exists());
    assert!(!target.path().join("stale.md").exists());
    assert_eq!(
        fs::read_to_string(target.path().join("Doc/block.md")).expect("copied"),
        "new"
    );
}

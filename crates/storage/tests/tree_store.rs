#![forbid(unsafe_code)]

use dm_core::ids::{BranchName, RepoId};
use dm_core::model::{DisplayMode, NodeKind, SyncState};
use dm_storage::{NewBlock, NewDoc, NewRepository, SqliteStore, StoreError};
use tempfile::TempDir;

fn open_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = SqliteStore::open(dir.path()).expect("open store");
    (dir, store)
}

fn new_repo(store: &mut SqliteStore, title: &str) -> RepoId {
    store
        .repo_create(NewRepository {
            title: title.to_string(),
            ..NewRepository::default()
        })
        .expect("create repo")
        .id
}

fn branch(name: &str) -> BranchName {
    BranchName::try_new(name).expect("branch name")
}

fn doc(parent_id: Option<i64>, title: &str) -> NewDoc {
    NewDoc {
        parent_id,
        title: title.to_string(),
        ..NewDoc::default()
    }
}

#[test]
fn new_repository_knows_main() {
    let (_dir, mut store) = open_store();
    let repo = store
        .repo_create(NewRepository {
            title: "  Handbook ".to_string(),
            description: "team notes".to_string(),
            remote_url: Some("   ".to_string()),
            display_mode: DisplayMode::List,
        })
        .expect("create repo");

    assert_eq!(repo.title, "Handbook");
    assert_eq!(repo.current_branch, BranchName::main());
    assert_eq!(repo.branches, vec![BranchName::main()]);
    assert_eq!(repo.remote_url, None);
    assert_eq!(repo.display_mode, DisplayMode::List);

    let err = store
        .repo_create(NewRepository::default())
        .expect_err("empty title");
    assert!(matches!(err, StoreError::InvalidInput(_)));

    let listed = store.repo_list().expect("list repos");
    assert_eq!(listed.len(), 1);
    assert!(store.repo_get(RepoId::new(99)).unwrap_err().is_not_found());
}

#[test]
fn current_branch_must_be_known() {
    let (_dir, mut store) = open_store();
    let repo = new_repo(&mut store, "r");
    let exp = branch("exp");

    let err = store
        .repo_set_current_branch(repo, &exp)
        .expect_err("unknown branch");
    assert!(matches!(err, StoreError::UnknownBranch(_)));

    assert!(store.repo_add_branch(repo, &exp).expect("add branch"));
    assert!(!store.repo_add_branch(repo, &exp).expect("add branch again"));
    let previous = store
        .repo_set_current_branch(repo, &exp)
        .expect("switch branch");
    assert_eq!(previous, Some(BranchName::main()));

    let loaded = store.repo_get(repo).expect("get repo");
    assert_eq!(loaded.current_branch, exp);
    assert!(loaded.knows_branch(&BranchName::main()));
}

#[test]
fn docs_get_paths_and_appended_order() {
    let (_dir, mut store) = open_store();
    let repo = new_repo(&mut store, "r");
    let b = branch("work");

    let root = store.doc_create(repo, &b, doc(None, "Root")).expect("root");
    let first = store
        .doc_create(repo, &b, doc(Some(root.id), "First"))
        .expect("first");
    let second = store
        .doc_create(repo, &b, doc(Some(root.id), "Second"))
        .expect("second");
    let nested = store
        .doc_create(repo, &b, doc(Some(second.id), "Nested"))
        .expect("nested");

    assert_eq!(root.path, format!("/{}", root.id));
    assert_eq!(nested.path, format!("/{}/{}/{}", root.id, second.id, nested.id));
    assert_eq!((first.order, second.order), (0, 1));
    assert!(first.id < second.id && second.id < nested.id);

    let err = store
        .doc_create(repo, &b, doc(Some(9_999), "Lost"))
        .expect_err("unknown parent");
    assert!(matches!(err, StoreError::UnknownParent(9_999)));

    // Parents never cross branches.
    let err = store
        .doc_create(repo, &branch("other"), doc(Some(root.id), "Stray"))
        .expect_err("parent on another branch");
    assert!(err.is_not_found());
}

#[test]
fn doc_delete_does_not_cascade() {
    let (_dir, mut store) = open_store();
    let repo = new_repo(&mut store, "r");
    let b = branch("work");

    let parent = store.doc_create(repo, &b, doc(None, "Parent")).expect("parent");
    let child = store
        .doc_create(repo, &b, doc(Some(parent.id), "Child"))
        .expect("child");
    let block = store
        .block_create(
            repo,
            &b,
            NewBlock {
                doc_id: parent.id,
                title: "note".to_string(),
                body: "hello".to_string(),
                order: None,
            },
        )
        .expect("block");

    assert!(store.doc_delete(repo, &b, parent.id).expect("delete"));
    assert!(!store.doc_delete(repo, &b, parent.id).expect("delete again"));
    assert!(store.doc_get(repo, &b, child.id).expect("get child").is_some());
    assert!(store.block_get(repo, &b, block.id).expect("get block").is_some());
}

#[test]
fn edits_are_branch_scoped() {
    let (_dir, mut store) = open_store();
    let repo = new_repo(&mut store, "r");
    let a = branch("a");

    let d = store.doc_create(repo, &a, doc(None, "Doc")).expect("doc");
    let updated = store
        .doc_update(repo, &a, d.id, None, Some("body"))
        .expect("update")
        .expect("doc present");
    assert_eq!(updated.title, "Doc");
    assert_eq!(updated.body, "body");

    let missing = store
        .doc_update(repo, &branch("b"), d.id, Some("x"), None)
        .expect("update other branch");
    assert!(missing.is_none());

    let blk = store
        .block_create(
            repo,
            &a,
            NewBlock {
                doc_id: d.id,
                title: "b1".to_string(),
                body: String::new(),
                order: Some(7),
            },
        )
        .expect("block");
    assert_eq!(blk.order, 7);
    let edited = store
        .block_update(repo, &a, blk.id, Some("renamed"), None)
        .expect("edit block")
        .expect("block present");
    assert_eq!(edited.title, "renamed");
    assert_eq!(
        store
            .block_list_for_doc(repo, &a, d.id)
            .expect("blocks of doc")
            .len(),
        1
    );
}

#[test]
fn ids_are_unique_across_branches() {
    let (_dir, mut store) = open_store();
    let repo = new_repo(&mut store, "r");
    let a = store.doc_create(repo, &branch("a"), doc(None, "A")).expect("a");
    let b = store.doc_create(repo, &branch("b"), doc(None, "B")).expect("b");
    assert_ne!(a.id, b.id);

    let other = new_repo(&mut store, "other");
    let c = store.doc_create(other, &branch("a"), doc(None, "C")).expect("c");
    assert_eq!(c.id, 1);
}

#[test]
fn sync_state_defaults_to_clean() {
    let (_dir, mut store) = open_store();
    let repo = new_repo(&mut store, "r");
    let b = branch("exp");

    let record = store.sync_state_get(repo, &b).expect("get state");
    assert_eq!(record.state, SyncState::Clean);
    assert_eq!(record.updated_at_ms, None);

    store
        .sync_state_set(repo, &b, SyncState::Unsynced, Some("push rejected"))
        .expect("mark unsynced");
    let record = store.sync_state_get(repo, &b).expect("get state");
    assert_eq!(record.state, SyncState::Unsynced);
    assert_eq!(record.last_error.as_deref(), Some("push rejected"));

    store
        .sync_state_set(repo, &b, SyncState::Committed, Some("ignored"))
        .expect("mark committed");
    let record = store.sync_state_get(repo, &b).expect("get state");
    assert_eq!(record.state, SyncState::Committed);
    assert_eq!(record.last_error, None);
}

#[test]
fn keyword_scan_matches_all_terms() {
    let (_dir, mut store) = open_store();
    let repo = new_repo(&mut store, "r");
    let b = branch("work");

    let guide = store
        .doc_create(
            repo,
            &b,
            NewDoc {
                title: "Deploy Guide".to_string(),
                body: "Steps for the Staging cluster".to_string(),
                ..NewDoc::default()
            },
        )
        .expect("doc");
    store
        .block_create(
            repo,
            &b,
            NewBlock {
                doc_id: guide.id,
                title: "rollback".to_string(),
                body: "Undo a staging deploy".to_string(),
                order: None,
            },
        )
        .expect("block");
    store
        .doc_create(repo, &b, doc(None, "Unrelated"))
        .expect("doc");

    let terms = vec!["DEPLOY".to_string(), "staging".to_string()];
    let (hits, total) = store
        .search_nodes(repo, &b, &terms, None, 10, 0)
        .expect("search");
    assert_eq!(total, 2);
    assert_eq!(hits[0].kind, NodeKind::Doc);
    assert_eq!(hits[1].kind, NodeKind::Block);

    let (hits, total) = store
        .search_nodes(repo, &b, &terms, Some(NodeKind::Block), 10, 0)
        .expect("search blocks");
    assert_eq!((hits.len(), total), (1, 1));

    let (page, total) = store
        .search_nodes(repo, &b, &terms, None, 1, 1)
        .expect("search page");
    assert_eq!(total, 2);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "rollback");

    let (hits, _) = store
        .search_nodes(repo, &branch("main"), &terms, None, 10, 0)
        .expect("search main");
    assert!(hits.is_empty());
}

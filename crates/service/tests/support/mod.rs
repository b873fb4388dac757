#![allow(dead_code)]

use dm_core::ids::{BranchName, RepoId};
use dm_service::DocService;
use dm_service::config::ServiceConfig;
use dm_storage::{NewBlock, NewDoc, NewRepository, SqliteStore};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub service: DocService,
}

pub fn config(dir: &Path) -> ServiceConfig {
    ServiceConfig {
        storage_dir: dir.to_path_buf(),
        ..ServiceConfig::default()
    }
}

/// Open a service whose `main` branch already holds one doc with one block. Main is
/// read-only through the service, so it is seeded through the store directly.
pub fn seeded(title: &str) -> (Fixture, RepoId) {
    let dir = TempDir::new().expect("temp dir");
    let repo = {
        let mut store = SqliteStore::open(dir.path()).expect("open store");
        let repo = store
            .repo_create(NewRepository {
                title: title.to_string(),
                ..NewRepository::default()
            })
            .expect("create repo")
            .id;
        let main = BranchName::main();
        let doc = store
            .doc_create(
                repo,
                &main,
                NewDoc {
                    title: "Guide".to_string(),
                    body: "welcome".to_string(),
                    ..NewDoc::default()
                },
            )
            .expect("seed doc");
        store
            .block_create(
                repo,
                &main,
                NewBlock {
                    doc_id: doc.id,
                    title: "intro".to_string(),
                    body: "first block".to_string(),
                    order: None,
                },
            )
            .expect("seed block");
        repo
    };
    let service = DocService::open(config(dir.path())).expect("open service");
    (Fixture { dir, service }, repo)
}

pub fn bare_remote(dir: &Path) -> String {
    let status = Command::new("git")
        .args(["init", "--quiet", "--bare"])
        .arg(dir)
        .status()
        .expect("spawn git init --bare");
    assert!(status.success(), "git init --bare failed");
    dir.to_string_lossy().into_owned()
}

pub fn branch(name: &str) -> BranchName {
    BranchName::try_new(name).expect("branch name")
}

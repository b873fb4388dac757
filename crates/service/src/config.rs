#![forbid(unsafe_code)]

use dm_core::model::Actor;
use dm_vcs::GitConfig;
use std::path::PathBuf;

pub const DEFAULT_STORAGE_DIR: &str = ".docmirror";
pub const REPOS_DIR: &str = "repos";

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Holds the SQLite database and the `repos/` working copies.
    pub storage_dir: PathBuf,
    pub git: GitConfig,
    /// Author of commits when the caller names nobody.
    pub actor: Actor,
}

impl ServiceConfig {
    pub fn repos_dir(&self) -> PathBuf {
        self.storage_dir.join(REPOS_DIR)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            git: GitConfig::default(),
            actor: Actor::new("system", "docmirror"),
        }
    }
}

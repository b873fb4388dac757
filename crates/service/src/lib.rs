#![forbid(unsafe_code)]

//! Branch lifecycle, synchronization and batch reconciliation over one store and its git
//! mirror.

pub mod config;
mod error;
mod lifecycle;
mod nodes;
mod reconcile;
mod repos;
mod search;
mod sync;

pub use error::{ErrorKind, ServiceError};
pub use lifecycle::{BranchEntry, BranchList};
pub use nodes::{DocView, TreeEntry};
pub use reconcile::{BatchFailure, BatchReport, CommitReport, Skipped};
pub use search::{DEFAULT_SEARCH_LIMIT, KeywordSearch, SearchPage, SearchQuery, StoreScan};
pub use sync::{BranchStatus, CommitOutcome, PullOutcome, PushOutcome};

use config::ServiceConfig;
use dm_storage::SqliteStore;
use dm_vcs::GitGateway;

pub struct DocService {
    store: SqliteStore,
    git: GitGateway,
    search: Box<dyn KeywordSearch + Send>,
    config: ServiceConfig,
}

impl std::fmt::Debug for DocService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocService")
            .field("storage_dir", &self.config.storage_dir)
            .finish()
    }
}

impl DocService {
    pub fn open(config: ServiceConfig) -> Result<Self, ServiceError> {
        let store = SqliteStore::open(&config.storage_dir)?;
        let git = GitGateway::new(config.repos_dir(), config.git.clone());
        tracing::info!(storage_dir = %config.storage_dir.display(), "service opened");
        Ok(Self {
            store,
            git,
            search: Box::new(StoreScan),
            config,
        })
    }

    /// Replace the keyword search backend.
    pub fn with_search(mut self, search: Box<dyn KeywordSearch + Send>) -> Self {
        self.search = search;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn git(&self) -> &GitGateway {
        &self.git
    }
}

#![forbid(unsafe_code)]

use crate::{DocService, ServiceError};
use dm_core::ids::{BranchName, RepoId};
use dm_core::model::NodeKind;
use dm_storage::{SearchHit, SqliteStore};

pub const DEFAULT_SEARCH_LIMIT: usize = 20;

#[derive(Clone, Debug)]
pub struct SearchQuery {
    /// Tenant scope forwarded to external indexes; the store scan ignores it.
    pub domain_id: Option<String>,
    pub repo_id: RepoId,
    pub branch: BranchName,
    pub keywords: Vec<String>,
    pub kind: Option<NodeKind>,
    pub limit: usize,
    pub skip: usize,
}

#[derive(Clone, Debug, Default)]
pub struct SearchPage {
    pub results: Vec<SearchHit>,
    pub total: usize,
}

/// Keyword lookup over docs and blocks. Implementations may keep their own index; the
/// store is passed for those that scan it.
pub trait KeywordSearch {
    fn search(&self, store: &SqliteStore, query: &SearchQuery) -> Result<SearchPage, ServiceError>;
}

/// Scan of the store itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoreScan;

impl KeywordSearch for StoreScan {
    fn search(&self, store: &SqliteStore, query: &SearchQuery) -> Result<SearchPage, ServiceError> {
        let (results, total) = store.search_nodes(
            query.repo_id,
            &query.branch,
            &query.keywords,
            query.kind,
            query.limit,
            query.skip,
        )?;
        Ok(SearchPage { results, total })
    }
}

impl DocService {
    pub fn search(&self, query: &SearchQuery) -> Result<SearchPage, ServiceError> {
        if query.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ServiceError::InvalidInput("keywords are empty".to_string()));
        }
        self.store.repo_get(query.repo_id)?;
        self.search.search(&self.store, query)
    }
}

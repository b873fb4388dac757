#![forbid(unsafe_code)]

use crate::{DocService, ServiceError};
use dm_core::ids::RepoId;
use dm_core::model::Repository;
use dm_storage::NewRepository;
use dm_vcs::RemoteInfo;

impl DocService {
    pub fn repo_create(&mut self, request: NewRepository) -> Result<Repository, ServiceError> {
        let repository = self.store.repo_create(request)?;
        tracing::info!(repo = %repository.id, "repository created");
        Ok(repository)
    }

    pub fn repo_get(&self, repo: RepoId) -> Result<Repository, ServiceError> {
        Ok(self.store.repo_get(repo)?)
    }

    pub fn repo_list(&self) -> Result<Vec<Repository>, ServiceError> {
        Ok(self.store.repo_list()?)
    }

    /// Store a new remote URL, or clear it with `None`. The working copy picks it up on
    /// the next push, pull or status.
    pub fn repo_set_remote(
        &mut self,
        repo: RepoId,
        remote_url: Option<&str>,
    ) -> Result<Repository, ServiceError> {
        Ok(self.store.repo_set_remote(repo, remote_url)?)
    }

    pub fn verify_remote(&self, url: &str) -> Result<RemoteInfo, ServiceError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ServiceError::InvalidInput("remote url is empty".to_string()));
        }
        Ok(self.git.verify_remote(url)?)
    }
}

#![forbid(unsafe_code)]

use crate::{DocService, ServiceError};
use dm_core::ids::{BranchName, RepoId};
use dm_core::model::{Actor, Repository};
use dm_storage::SyncRecord;

#[derive(Clone, Debug)]
pub struct BranchEntry {
    pub name: BranchName,
    pub is_current: bool,
    pub sync: SyncRecord,
}

#[derive(Clone, Debug)]
pub struct BranchList {
    pub current: BranchName,
    pub branches: Vec<BranchEntry>,
}

impl DocService {
    /// Parse a caller-supplied branch name, falling back to the repository's current
    /// branch. The branch must be known to the repository.
    pub fn resolve_branch(
        &self,
        repo: RepoId,
        branch: Option<&str>,
    ) -> Result<BranchName, ServiceError> {
        let repository = self.store.repo_get(repo)?;
        let Some(raw) = branch.map(str::trim).filter(|b| !b.is_empty()) else {
            return Ok(repository.current_branch);
        };
        let name = parse_branch(raw)?;
        if !repository.knows_branch(&name) {
            return Err(ServiceError::not_found(format!("branch {name}")));
        }
        Ok(name)
    }

    pub(crate) fn ensure_mutable(branch: &BranchName) -> Result<(), ServiceError> {
        if branch.is_main() {
            return Err(ServiceError::ReadOnlyBranch(branch.to_string()));
        }
        Ok(())
    }

    /// Fork `name` off `main`: commit main's current projection, branch the working copy,
    /// clone main's docs and blocks with fresh ids, and make the new branch current.
    pub fn create_branch(
        &mut self,
        repo: RepoId,
        name: &str,
        actor: Option<&Actor>,
    ) -> Result<Repository, ServiceError> {
        let repository = self.store.repo_get(repo)?;
        if !repository.current_branch.is_main() {
            return Err(ServiceError::Policy(format!(
                "branches can only be created from main (current branch is {})",
                repository.current_branch
            )));
        }
        let name = parse_branch(name)?;
        if name.is_main() {
            return Err(ServiceError::InvalidInput(
                "main already exists".to_string(),
            ));
        }
        if repository.knows_branch(&name) {
            return Err(ServiceError::InvalidInput(format!(
                "branch {name} already exists"
            )));
        }

        // Git goes first; the store only learns the name once the git branch exists.
        let main = BranchName::main();
        self.commit(repo, &main, None, actor)?;
        {
            let wc = self.git.lease(repo);
            wc.branch_from(&name, &main)?;
        }
        let counts = self.store.branch_fork(repo, &main, &name)?;

        tracing::info!(repo = %repo, branch = %name, docs = counts.docs, blocks = counts.blocks, "branch created");
        Ok(self.store.repo_get(repo)?)
    }

    /// Move the current-branch pointer. Neither the store nor the working copy changes.
    pub fn switch_branch(&mut self, repo: RepoId, name: &str) -> Result<Repository, ServiceError> {
        let name = parse_branch(name)?;
        let repository = self.store.repo_get(repo)?;
        if !repository.knows_branch(&name) {
            return Err(ServiceError::not_found(format!("branch {name}")));
        }
        self.store.repo_set_current_branch(repo, &name)?;
        Ok(self.store.repo_get(repo)?)
    }

    pub fn list_branches(&self, repo: RepoId) -> Result<BranchList, ServiceError> {
        let repository = self.store.repo_get(repo)?;
        let mut branches = Vec::with_capacity(repository.branches.len());
        for name in repository.branches {
            let sync = self.store.sync_state_get(repo, &name)?;
            branches.push(BranchEntry {
                is_current: name == repository.current_branch,
                name,
                sync,
            });
        }
        Ok(BranchList {
            current: repository.current_branch,
            branches,
        })
    }
}

pub(crate) fn parse_branch(raw: &str) -> Result<BranchName, ServiceError> {
    BranchName::try_new(raw.trim())
        .map_err(|err| ServiceError::InvalidInput(format!("branch name: {}", err.message())))
}

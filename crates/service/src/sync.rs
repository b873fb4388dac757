#![forbid(unsafe_code)]

use crate::{DocService, ServiceError};
use dm_core::ids::{BranchName, RepoId};
use dm_core::model::{Actor, SyncState, commit_message};
use dm_storage::SyncRecord;
use dm_vcs::{VcsStatus, import_tree, project, redact_url, replace_contents};
use tempfile::TempDir;

#[derive(Clone, Debug)]
pub struct CommitOutcome {
    /// `None` when the projection matched the last commit.
    pub commit: Option<String>,
    pub message: String,
    pub docs: usize,
    pub blocks: usize,
}

#[derive(Clone, Debug)]
pub struct PushOutcome {
    pub remote: String,
    pub set_upstream: bool,
}

#[derive(Clone, Debug)]
pub struct PullOutcome {
    pub docs: usize,
    pub blocks: usize,
}

#[derive(Clone, Debug)]
pub struct BranchStatus {
    pub branch: BranchName,
    pub vcs: VcsStatus,
    pub sync: SyncRecord,
}

impl DocService {
    /// Project `branch` into the working copy and commit it when anything changed.
    pub fn commit(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        message: Option<&str>,
        actor: Option<&Actor>,
    ) -> Result<CommitOutcome, ServiceError> {
        let snapshot = self.store.branch_snapshot(repo, branch)?;
        let actor = actor.unwrap_or(&self.config.actor);
        let message = commit_message(repo, actor, message);

        let result = (|| -> Result<CommitOutcome, ServiceError> {
            let wc = self.git.lease(repo);
            wc.ensure_initialized()?;
            wc.checkout(branch)?;

            let scratch = TempDir::new()?;
            let report = project(&snapshot, scratch.path())?;
            replace_contents(scratch.path(), wc.path())?;
            wc.stage_all()?;
            let commit = wc.commit_if_dirty(&message)?;
            Ok(CommitOutcome {
                commit,
                message: message.clone(),
                docs: report.docs,
                blocks: report.blocks,
            })
        })();

        match result {
            Ok(outcome) => {
                // An unchanged tree does not undo a push.
                let recorded = self.store.sync_state_get(repo, branch)?.state;
                let keep = outcome.commit.is_none()
                    && matches!(recorded, SyncState::Pushed | SyncState::Committed);
                if !keep {
                    self.store
                        .sync_state_set(repo, branch, SyncState::Committed, None)?;
                }
                tracing::info!(
                    repo = %repo,
                    branch = %branch,
                    commit = outcome.commit.as_deref().unwrap_or("unchanged"),
                    "commit finished"
                );
                Ok(outcome)
            }
            Err(err) => Err(self.mark_unsynced(repo, branch, "commit", err)),
        }
    }

    pub fn push(&mut self, repo: RepoId, branch: &BranchName) -> Result<PushOutcome, ServiceError> {
        if branch.is_main() {
            return Err(ServiceError::ReadOnlyBranch(branch.to_string()));
        }
        let repository = self.store.repo_get(repo)?;
        let Some(url) = repository.remote_url else {
            return Err(ServiceError::not_found(format!("remote url for repository {repo}")));
        };

        let result = (|| -> Result<bool, ServiceError> {
            let wc = self.git.lease(repo);
            if !wc.exists() {
                return Err(ServiceError::not_found(format!(
                    "working copy for repository {repo}"
                )));
            }
            wc.set_remote(&url)?;
            wc.checkout(branch)?;
            Ok(wc.push(branch)?)
        })();

        match result {
            Ok(set_upstream) => {
                self.store
                    .sync_state_set(repo, branch, SyncState::Pushed, None)?;
                let remote = redact_url(&url);
                tracing::info!(repo = %repo, branch = %branch, remote = %remote, set_upstream, "push finished");
                Ok(PushOutcome {
                    remote,
                    set_upstream,
                })
            }
            Err(err) => Err(self.mark_unsynced(repo, branch, "push", err)),
        }
    }

    /// Reset the working copy to the remote branch and rebuild the branch's store contents
    /// from it. Allowed on `main`.
    pub fn pull(&mut self, repo: RepoId, branch: &BranchName) -> Result<PullOutcome, ServiceError> {
        let repository = self.store.repo_get(repo)?;
        let Some(url) = repository.remote_url else {
            return Err(ServiceError::not_found(format!("remote url for repository {repo}")));
        };

        let imported = (|| -> Result<_, ServiceError> {
            let wc = self.git.lease(repo);
            wc.ensure_initialized()?;
            wc.set_remote(&url)?;
            wc.pull_reset(branch)?;
            Ok(import_tree(wc.path())?)
        })();
        let tree = match imported {
            Ok(tree) => tree,
            Err(err) => return Err(self.mark_unsynced(repo, branch, "pull", err)),
        };

        let counts = match self.store.branch_import(repo, branch, &tree) {
            Ok(counts) => counts,
            Err(err) => return Err(self.mark_unsynced(repo, branch, "pull", err.into())),
        };
        self.store
            .sync_state_set(repo, branch, SyncState::Pushed, None)?;
        tracing::info!(repo = %repo, branch = %branch, docs = counts.docs, blocks = counts.blocks, "pull finished");
        Ok(PullOutcome {
            docs: counts.docs,
            blocks: counts.blocks,
        })
    }

    /// Working-copy status of `branch` plus its recorded sync state. `remote_url` overrides
    /// the repository's remote for this query only.
    pub fn status(
        &self,
        repo: RepoId,
        branch: &BranchName,
        remote_url: Option<&str>,
    ) -> Result<BranchStatus, ServiceError> {
        let repository = self.store.repo_get(repo)?;
        let remote = remote_url
            .map(str::to_string)
            .or(repository.remote_url);
        let vcs = {
            let wc = self.git.lease(repo);
            wc.status(branch, remote.as_deref())
        };
        let sync = self.store.sync_state_get(repo, branch)?;
        Ok(BranchStatus {
            branch: branch.clone(),
            vcs,
            sync,
        })
    }

    pub(crate) fn mark_dirty(&mut self, repo: RepoId, branch: &BranchName) -> Result<(), ServiceError> {
        self.store
            .sync_state_set(repo, branch, SyncState::Dirty, None)?;
        Ok(())
    }

    fn mark_unsynced(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        step: &str,
        err: ServiceError,
    ) -> ServiceError {
        let text = format!("{step}: {err}");
        tracing::warn!(repo = %repo, branch = %branch, error = %text, "sync step failed");
        if let Err(mark_err) = self
            .store
            .sync_state_set(repo, branch, SyncState::Unsynced, Some(&text))
        {
            tracing::warn!(repo = %repo, branch = %branch, error = %mark_err, "recording sync failure failed");
        }
        err
    }
}

#![forbid(unsafe_code)]

use crate::{DocService, ServiceError};
use dm_core::batch::{
    BatchRequest, CreatedItem, NodeRef, UnresolvedCreate, resolve_creates,
};
use dm_core::ids::{BranchName, RepoId};
use dm_core::model::{Actor, NodeKind};
use dm_core::structure::RejectedEntry;
use dm_storage::{NewBlock, NewDoc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Skipped {
    /// Delete target not present in the branch.
    Delete(NodeRef),
    /// Update target not present in the branch.
    Update(NodeRef),
}

/// A store error hit while applying one part of a batch. The rest of the batch still runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchFailure {
    Delete(NodeRef, String),
    Update(NodeRef, String),
    Structure(String),
}

#[derive(Clone, Debug, Default)]
pub struct CommitReport {
    pub ok: bool,
    pub commit: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub deleted: Vec<NodeRef>,
    pub created: Vec<CreatedItem>,
    pub unresolved: Vec<UnresolvedCreate>,
    pub create_passes: usize,
    pub updated: Vec<NodeRef>,
    pub skipped: Vec<Skipped>,
    pub rejected: Vec<RejectedEntry>,
    pub failures: Vec<BatchFailure>,
    pub commit: CommitReport,
}

impl BatchReport {
    /// Whether the store may differ from what it held before the batch.
    fn touched_store(&self) -> bool {
        !self.deleted.is_empty()
            || !self.created.is_empty()
            || !self.updated.is_empty()
            || !self.failures.is_empty()
    }
}

impl DocService {
    /// Apply deletes, creates, updates and structure changes to `branch`, then commit.
    ///
    /// Store errors on individual deletes, updates or the structure pass land in
    /// [`BatchReport::failures`] and the commit still runs. Store changes are kept when the
    /// commit fails; the failure is reported in [`BatchReport::commit`] and the branch is
    /// marked unsynced.
    pub fn apply_batch(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        request: &BatchRequest,
        actor: Option<&Actor>,
    ) -> Result<BatchReport, ServiceError> {
        Self::ensure_mutable(branch)?;
        self.store.repo_get(repo)?;
        let mut report = BatchReport::default();

        for target in &request.deletes {
            let removed = match target.kind {
                NodeKind::Doc => self.store.doc_delete(repo, branch, target.id),
                NodeKind::Block => self.store.block_delete(repo, branch, target.id),
            };
            match removed {
                Ok(true) => report.deleted.push(*target),
                Ok(false) => report.skipped.push(Skipped::Delete(*target)),
                Err(err) => report
                    .failures
                    .push(BatchFailure::Delete(*target, err.to_string())),
            }
        }

        let store = &mut self.store;
        let resolution = resolve_creates(&request.creates, |item, parent| match item.kind {
            NodeKind::Doc => store
                .doc_create(
                    repo,
                    branch,
                    NewDoc {
                        parent_id: parent,
                        title: item.title.clone(),
                        body: item.content.clone(),
                        order: item.order,
                    },
                )
                .map(|doc| doc.id),
            NodeKind::Block => store
                .block_create(
                    repo,
                    branch,
                    NewBlock {
                        doc_id: parent.unwrap_or_default(),
                        title: item.title.clone(),
                        body: item.content.clone(),
                        order: item.order,
                    },
                )
                .map(|block| block.id),
        });
        for unresolved in &resolution.unresolved {
            tracing::warn!(
                repo = %repo,
                branch = %branch,
                kind = unresolved.kind.as_str(),
                placeholder = unresolved.placeholder_id.as_deref().unwrap_or(""),
                reason = %unresolved.reason.describe(),
                "create not applied"
            );
        }
        report.created = resolution.created;
        report.unresolved = resolution.unresolved;
        report.create_passes = resolution.passes;

        for update in &request.updates {
            let title = update.title.as_deref();
            let body = update.content.as_deref();
            let found = match update.target.kind {
                NodeKind::Doc => self
                    .store
                    .doc_update(repo, branch, update.target.id, title, body)
                    .map(|doc| doc.is_some()),
                NodeKind::Block => self
                    .store
                    .block_update(repo, branch, update.target.id, title, body)
                    .map(|block| block.is_some()),
            };
            match found {
                Ok(true) => report.updated.push(update.target),
                Ok(false) => report.skipped.push(Skipped::Update(update.target)),
                Err(err) => report
                    .failures
                    .push(BatchFailure::Update(update.target, err.to_string())),
            }
        }

        let mut moved = false;
        if !request.structure.is_empty() {
            match self.store.structure_apply(repo, branch, &request.structure) {
                Ok(plan) => {
                    moved = plan.rejected.len() < request.structure.len();
                    report.rejected = plan.rejected;
                }
                Err(err) => report
                    .failures
                    .push(BatchFailure::Structure(err.to_string())),
            }
        }
        for failure in &report.failures {
            tracing::warn!(repo = %repo, branch = %branch, failure = ?failure, "batch step failed");
        }
        if moved || report.touched_store() {
            self.mark_dirty(repo, branch)?;
        }

        report.commit = match self.commit(repo, branch, request.message.as_deref(), actor) {
            Ok(outcome) => CommitReport {
                ok: true,
                commit: outcome.commit,
                message: Some(outcome.message),
                error: None,
            },
            Err(err) => {
                tracing::warn!(repo = %repo, branch = %branch, error = %err, "batch commit failed");
                CommitReport {
                    ok: false,
                    commit: None,
                    message: None,
                    error: Some(err.to_string()),
                }
            }
        };
        Ok(report)
    }
}

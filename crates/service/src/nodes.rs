#![forbid(unsafe_code)]

use crate::{DocService, ServiceError};
use dm_core::ids::{BranchName, RepoId};
use dm_core::model::{Block, Doc};
use dm_core::tree::Hierarchy;
use dm_storage::{NewBlock, NewDoc};

/// One doc with its direct children, each list in sibling order.
#[derive(Clone, Debug)]
pub struct DocView {
    pub doc: Doc,
    pub children: Vec<Doc>,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug)]
pub struct TreeEntry {
    pub doc: Doc,
    pub depth: usize,
    pub blocks: Vec<Block>,
}

impl DocService {
    pub fn query_doc(
        &self,
        repo: RepoId,
        branch: &BranchName,
        id: i64,
    ) -> Result<DocView, ServiceError> {
        let docs = self.store.doc_list(repo, branch)?;
        let blocks = self.store.block_list(repo, branch)?;
        let hierarchy = Hierarchy::build(&docs, &blocks);
        let Some(doc) = hierarchy.doc(id) else {
            return Err(ServiceError::not_found(format!("doc {id}")));
        };
        Ok(DocView {
            doc: doc.clone(),
            children: hierarchy.child_docs(id).cloned().collect(),
            blocks: hierarchy.blocks_of(id).iter().map(|b| (*b).clone()).collect(),
        })
    }

    /// Every doc of the branch in pre-order with its depth and blocks.
    pub fn query_tree(
        &self,
        repo: RepoId,
        branch: &BranchName,
    ) -> Result<Vec<TreeEntry>, ServiceError> {
        let docs = self.store.doc_list(repo, branch)?;
        let blocks = self.store.block_list(repo, branch)?;
        let hierarchy = Hierarchy::build(&docs, &blocks);
        Ok(hierarchy
            .walk()
            .into_iter()
            .map(|entry| TreeEntry {
                doc: entry.doc.clone(),
                depth: entry.depth,
                blocks: hierarchy
                    .blocks_of(entry.doc.id)
                    .iter()
                    .map(|b| (*b).clone())
                    .collect(),
            })
            .collect())
    }

    pub fn query_block(
        &self,
        repo: RepoId,
        branch: &BranchName,
        id: i64,
    ) -> Result<Block, ServiceError> {
        self.store
            .block_get(repo, branch, id)?
            .ok_or_else(|| ServiceError::not_found(format!("block {id}")))
    }

    pub fn create_doc(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        request: NewDoc,
    ) -> Result<Doc, ServiceError> {
        Self::ensure_mutable(branch)?;
        let doc = self.store.doc_create(repo, branch, request)?;
        self.mark_dirty(repo, branch)?;
        Ok(doc)
    }

    pub fn create_block(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        request: NewBlock,
    ) -> Result<Block, ServiceError> {
        Self::ensure_mutable(branch)?;
        let block = self.store.block_create(repo, branch, request)?;
        self.mark_dirty(repo, branch)?;
        Ok(block)
    }

    pub fn edit_doc(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        id: i64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<Doc, ServiceError> {
        Self::ensure_mutable(branch)?;
        let doc = self
            .store
            .doc_update(repo, branch, id, title, body)?
            .ok_or_else(|| ServiceError::not_found(format!("doc {id}")))?;
        self.mark_dirty(repo, branch)?;
        Ok(doc)
    }

    pub fn edit_block(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        id: i64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<Block, ServiceError> {
        Self::ensure_mutable(branch)?;
        let block = self
            .store
            .block_update(repo, branch, id, title, body)?
            .ok_or_else(|| ServiceError::not_found(format!("block {id}")))?;
        self.mark_dirty(repo, branch)?;
        Ok(block)
    }

    /// Remove one doc. Its child docs and blocks stay in the store.
    pub fn delete_doc(&mut self, repo: RepoId, branch: &BranchName, id: i64) -> Result<(), ServiceError> {
        Self::ensure_mutable(branch)?;
        if !self.store.doc_delete(repo, branch, id)? {
            return Err(ServiceError::not_found(format!("doc {id}")));
        }
        self.mark_dirty(repo, branch)
    }

    pub fn delete_block(&mut self, repo: RepoId, branch: &BranchName, id: i64) -> Result<(), ServiceError> {
        Self::ensure_mutable(branch)?;
        if !self.store.block_delete(repo, branch, id)? {
            return Err(ServiceError::not_found(format!("block {id}")));
        }
        self.mark_dirty(repo, branch)
    }
}

#![forbid(unsafe_code)]

use super::*;
use super::repos::add_branch_tx;
use dm_core::model::{BranchSnapshot, child_path, root_path};
use dm_core::tree::{Hierarchy, ImportedTree};
use std::collections::BTreeMap;

impl SqliteStore {
    /// Remove every doc and block stored under `branch`. Returns the number of rows removed.
    pub fn branch_clear(&mut self, repo: RepoId, branch: &BranchName) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        ensure_repo_tx(&tx, repo)?;
        let removed = clear_branch_tx(&tx, repo, branch)?;
        tx.commit()?;
        Ok(removed)
    }

    /// Copy the docs and blocks of `from` into `to` with fresh ids and the same shape,
    /// order and content. Anything already stored under `to` is replaced.
    pub fn branch_clone(
        &mut self,
        repo: RepoId,
        from: &BranchName,
        to: &BranchName,
    ) -> Result<BranchCounts, StoreError> {
        if from == to {
            return Err(StoreError::InvalidInput("cannot clone a branch onto itself"));
        }
        let tx = self.conn.transaction()?;
        ensure_repo_tx(&tx, repo)?;
        let counts = clone_branch_tx(&tx, repo, from, to)?;
        tx.commit()?;
        tracing::debug!(repo = %repo, from = %from, to = %to, docs = counts.docs, blocks = counts.blocks, "branch cloned");
        Ok(counts)
    }

    /// Register `to`, fill it with a copy of `from` and make it the current branch, all in
    /// one transaction. Fails when `to` is already registered.
    pub fn branch_fork(
        &mut self,
        repo: RepoId,
        from: &BranchName,
        to: &BranchName,
    ) -> Result<BranchCounts, StoreError> {
        if from == to {
            return Err(StoreError::InvalidInput("cannot fork a branch onto itself"));
        }
        let tx = self.conn.transaction()?;
        ensure_repo_tx(&tx, repo)?;
        if !add_branch_tx(&tx, repo, to)? {
            return Err(StoreError::InvalidInput("branch is already registered"));
        }
        let counts = clone_branch_tx(&tx, repo, from, to)?;
        tx.execute(
            "UPDATE repositories SET current_branch=?2, updated_at_ms=?3 WHERE id=?1",
            params![repo.get(), to.as_str(), now_ms()],
        )?;
        tx.commit()?;
        Ok(counts)
    }

    /// Replace everything stored under `branch` with an imported hierarchy, registering the
    /// branch if needed. Either the whole tree lands or nothing changes.
    pub fn branch_import(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        tree: &ImportedTree,
    ) -> Result<BranchCounts, StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        ensure_repo_tx(&tx, repo)?;
        add_branch_tx(&tx, repo, branch)?;
        clear_branch_tx(&tx, repo, branch)?;

        let mut assigned: Vec<(i64, String)> = Vec::with_capacity(tree.docs.len());
        for (index, doc) in tree.docs.iter().enumerate() {
            let parent = match doc.parent {
                Some(parent) if parent < index => Some(&assigned[parent]),
                Some(_) => {
                    return Err(StoreError::InvalidRow(format!(
                        "imported doc {index} precedes its parent"
                    )));
                }
                None => None,
            };
            let id = allocate_id_tx(&tx, repo, NodeKind::Doc)?;
            let path = match parent {
                Some((_, parent_path)) => child_path(parent_path, id),
                None => root_path(id),
            };
            insert_doc_tx(
                &tx,
                repo,
                branch,
                DocRow {
                    id,
                    parent_id: parent.map(|(pid, _)| *pid),
                    title: &doc.title,
                    body: &doc.body,
                    order: doc.order,
                    path: &path,
                },
                now_ms,
            )?;
            assigned.push((id, path));
        }

        for block in &tree.blocks {
            let Some((doc_id, _)) = assigned.get(block.doc) else {
                return Err(StoreError::InvalidRow(format!(
                    "imported block references missing doc {}",
                    block.doc
                )));
            };
            let id = allocate_id_tx(&tx, repo, NodeKind::Block)?;
            insert_block_tx(
                &tx,
                repo,
                branch,
                BlockRow {
                    id,
                    doc_id: *doc_id,
                    title: &block.title,
                    body: &block.body,
                    order: block.order,
                },
                now_ms,
            )?;
        }
        tx.commit()?;

        Ok(BranchCounts {
            docs: tree.docs.len(),
            blocks: tree.blocks.len(),
        })
    }

    pub fn branch_snapshot(
        &self,
        repo: RepoId,
        branch: &BranchName,
    ) -> Result<BranchSnapshot, StoreError> {
        let repository = self.repo_get(repo)?;
        Ok(BranchSnapshot {
            repository,
            branch: branch.clone(),
            docs: docs_list_tx(&self.conn, repo, branch)?,
            blocks: blocks_list_tx(&self.conn, repo, branch)?,
        })
    }
}

struct DocRow<'a> {
    id: i64,
    parent_id: Option<i64>,
    title: &'a str,
    body: &'a str,
    order: i64,
    path: &'a str,
}

struct BlockRow<'a> {
    id: i64,
    doc_id: i64,
    title: &'a str,
    body: &'a str,
    order: i64,
}

fn clone_branch_tx(
    tx: &Transaction<'_>,
    repo: RepoId,
    from: &BranchName,
    to: &BranchName,
) -> Result<BranchCounts, StoreError> {
    let now_ms = now_ms();
    clear_branch_tx(tx, repo, to)?;

    let docs = docs_list_tx(tx, repo, from)?;
    let blocks = blocks_list_tx(tx, repo, from)?;
    let hierarchy = Hierarchy::build(&docs, &blocks);

    // old id -> (new id, new path)
    let mut remap: BTreeMap<i64, (i64, String)> = BTreeMap::new();
    let mut counts = BranchCounts::default();
    for entry in hierarchy.walk() {
        let doc = entry.doc;
        let parent = doc
            .parent_id
            .and_then(|old| remap.get(&old))
            .map(|(id, path)| (*id, path.clone()));
        let id = allocate_id_tx(tx, repo, NodeKind::Doc)?;
        let path = match &parent {
            Some((_, parent_path)) => child_path(parent_path, id),
            None => root_path(id),
        };
        insert_doc_tx(
            tx,
            repo,
            to,
            DocRow {
                id,
                parent_id: parent.map(|(pid, _)| pid),
                title: &doc.title,
                body: &doc.body,
                order: doc.order,
                path: &path,
            },
            now_ms,
        )?;
        remap.insert(doc.id, (id, path));
        counts.docs += 1;

        for block in hierarchy.blocks_of(doc.id) {
            let block_id = allocate_id_tx(tx, repo, NodeKind::Block)?;
            insert_block_tx(
                tx,
                repo,
                to,
                BlockRow {
                    id: block_id,
                    doc_id: id,
                    title: &block.title,
                    body: &block.body,
                    order: block.order,
                },
                now_ms,
            )?;
            counts.blocks += 1;
        }
    }
    let skipped = hierarchy.orphan_blocks().len();
    if skipped > 0 {
        tracing::warn!(repo = %repo, from = %from, skipped, "orphan blocks not cloned");
    }
    Ok(counts)
}

fn clear_branch_tx(
    conn: &Connection,
    repo: RepoId,
    branch: &BranchName,
) -> Result<usize, StoreError> {
    let blocks = conn.execute(
        "DELETE FROM blocks WHERE repo_id=?1 AND branch=?2",
        params![repo.get(), branch.as_str()],
    )?;
    let docs = conn.execute(
        "DELETE FROM docs WHERE repo_id=?1 AND branch=?2",
        params![repo.get(), branch.as_str()],
    )?;
    Ok(blocks + docs)
}

fn insert_doc_tx(
    conn: &Connection,
    repo: RepoId,
    branch: &BranchName,
    row: DocRow<'_>,
    now_ms: i64,
) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO docs(repo_id, id, branch, parent_id, title, body, sort_order, path, created_at_ms, updated_at_ms)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        "#,
        params![
            repo.get(),
            row.id,
            branch.as_str(),
            row.parent_id,
            row.title,
            row.body,
            row.order,
            row.path,
            now_ms
        ],
    )?;
    Ok(())
}

fn insert_block_tx(
    conn: &Connection,
    repo: RepoId,
    branch: &BranchName,
    row: BlockRow<'_>,
    now_ms: i64,
) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO blocks(repo_id, id, branch, doc_id, title, body, sort_order, created_at_ms, updated_at_ms)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        "#,
        params![
            repo.get(),
            row.id,
            branch.as_str(),
            row.doc_id,
            row.title,
            row.body,
            row.order,
            now_ms
        ],
    )?;
    Ok(())
}

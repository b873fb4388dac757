#![forbid(unsafe_code)]

use super::*;

impl SqliteStore {
    pub fn block_create(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        request: NewBlock,
    ) -> Result<Block, StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        ensure_repo_tx(&tx, repo)?;
        if doc_get_tx(&tx, repo, branch, request.doc_id)?.is_none() {
            return Err(StoreError::UnknownParent(request.doc_id));
        }

        let order = match request.order {
            Some(order) => order,
            None => {
                let max: Option<i64> = tx.query_row(
                    "SELECT MAX(sort_order) FROM blocks WHERE repo_id=?1 AND branch=?2 AND doc_id=?3",
                    params![repo.get(), branch.as_str(), request.doc_id],
                    |row| row.get(0),
                )?;
                max.map(|m| m + 1).unwrap_or(0)
            }
        };

        let id = allocate_id_tx(&tx, repo, NodeKind::Block)?;
        tx.execute(
            r#"
            INSERT INTO blocks(repo_id, id, branch, doc_id, title, body, sort_order, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
            params![
                repo.get(),
                id,
                branch.as_str(),
                request.doc_id,
                request.title,
                request.body,
                order,
                now_ms
            ],
        )?;
        tx.commit()?;

        Ok(Block {
            id,
            repo_id: repo,
            branch: branch.clone(),
            doc_id: request.doc_id,
            title: request.title,
            body: request.body,
            order,
            updated_at_ms: now_ms,
        })
    }

    pub fn block_get(
        &self,
        repo: RepoId,
        branch: &BranchName,
        id: i64,
    ) -> Result<Option<Block>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {BLOCK_COLUMNS} FROM blocks WHERE repo_id=?1 AND branch=?2 AND id=?3"
                ),
                params![repo.get(), branch.as_str(), id],
                |row| block_from_row(row, repo, branch),
            )
            .optional()?)
    }

    pub fn block_list(&self, repo: RepoId, branch: &BranchName) -> Result<Vec<Block>, StoreError> {
        blocks_list_tx(&self.conn, repo, branch)
    }

    pub fn block_list_for_doc(
        &self,
        repo: RepoId,
        branch: &BranchName,
        doc_id: i64,
    ) -> Result<Vec<Block>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks WHERE repo_id=?1 AND branch=?2 AND doc_id=?3 ORDER BY sort_order ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![repo.get(), branch.as_str(), doc_id], |row| {
            block_from_row(row, repo, branch)
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Apply title/body edits. Returns `None` when the block is not in this branch.
    pub fn block_update(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        id: i64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<Option<Block>, StoreError> {
        let Some(mut block) = self.block_get(repo, branch, id)? else {
            return Ok(None);
        };
        if let Some(title) = title {
            block.title = title.to_string();
        }
        if let Some(body) = body {
            block.body = body.to_string();
        }
        block.updated_at_ms = now_ms();
        self.conn.execute(
            "UPDATE blocks SET title=?4, body=?5, updated_at_ms=?6 WHERE repo_id=?1 AND branch=?2 AND id=?3",
            params![
                repo.get(),
                branch.as_str(),
                id,
                block.title,
                block.body,
                block.updated_at_ms
            ],
        )?;
        Ok(Some(block))
    }

    pub fn block_delete(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        id: i64,
    ) -> Result<bool, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM blocks WHERE repo_id=?1 AND branch=?2 AND id=?3",
            params![repo.get(), branch.as_str(), id],
        )?;
        Ok(deleted > 0)
    }
}

#![forbid(unsafe_code)]

use super::*;
use dm_core::model::{child_path, root_path};

impl SqliteStore {
    pub fn doc_create(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        request: NewDoc,
    ) -> Result<Doc, StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        ensure_repo_tx(&tx, repo)?;

        let parent_path = match request.parent_id {
            Some(parent) => match doc_get_tx(&tx, repo, branch, parent)? {
                Some(doc) => Some(doc.path),
                None => return Err(StoreError::UnknownParent(parent)),
            },
            None => None,
        };
        let order = match request.order {
            Some(order) => order,
            None => next_doc_order_tx(&tx, repo, branch, request.parent_id)?,
        };

        let id = allocate_id_tx(&tx, repo, NodeKind::Doc)?;
        let path = match parent_path.as_deref() {
            Some(parent_path) => child_path(parent_path, id),
            None => root_path(id),
        };
        tx.execute(
            r#"
            INSERT INTO docs(repo_id, id, branch, parent_id, title, body, sort_order, path, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
            params![
                repo.get(),
                id,
                branch.as_str(),
                request.parent_id,
                request.title,
                request.body,
                order,
                path,
                now_ms
            ],
        )?;
        tx.commit()?;

        Ok(Doc {
            id,
            repo_id: repo,
            branch: branch.clone(),
            parent_id: request.parent_id,
            title: request.title,
            body: request.body,
            order,
            path,
            updated_at_ms: now_ms,
        })
    }

    pub fn doc_get(
        &self,
        repo: RepoId,
        branch: &BranchName,
        id: i64,
    ) -> Result<Option<Doc>, StoreError> {
        doc_get_tx(&self.conn, repo, branch, id)
    }

    pub fn doc_list(&self, repo: RepoId, branch: &BranchName) -> Result<Vec<Doc>, StoreError> {
        docs_list_tx(&self.conn, repo, branch)
    }

    /// Apply title/body edits. Returns `None` when the doc is not in this branch.
    pub fn doc_update(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        id: i64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<Option<Doc>, StoreError> {
        let tx = self.conn.transaction()?;
        let Some(mut doc) = doc_get_tx(&tx, repo, branch, id)? else {
            return Ok(None);
        };
        if let Some(title) = title {
            doc.title = title.to_string();
        }
        if let Some(body) = body {
            doc.body = body.to_string();
        }
        doc.updated_at_ms = now_ms();
        tx.execute(
            "UPDATE docs SET title=?4, body=?5, updated_at_ms=?6 WHERE repo_id=?1 AND branch=?2 AND id=?3",
            params![
                repo.get(),
                branch.as_str(),
                id,
                doc.title,
                doc.body,
                doc.updated_at_ms
            ],
        )?;
        tx.commit()?;
        Ok(Some(doc))
    }

    /// Delete exactly one doc. Child docs and blocks are left in place.
    pub fn doc_delete(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        id: i64,
    ) -> Result<bool, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM docs WHERE repo_id=?1 AND branch=?2 AND id=?3",
            params![repo.get(), branch.as_str(), id],
        )?;
        Ok(deleted > 0)
    }
}

fn next_doc_order_tx(
    conn: &Connection,
    repo: RepoId,
    branch: &BranchName,
    parent_id: Option<i64>,
) -> Result<i64, StoreError> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(sort_order) FROM docs WHERE repo_id=?1 AND branch=?2 AND parent_id IS ?3",
        params![repo.get(), branch.as_str(), parent_id],
        |row| row.get(0),
    )?;
    Ok(max.map(|m| m + 1).unwrap_or(0))
}

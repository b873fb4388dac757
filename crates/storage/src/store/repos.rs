#![forbid(unsafe_code)]

use super::*;
use dm_core::model::Repository;

impl SqliteStore {
    pub fn repo_create(&mut self, request: NewRepository) -> Result<Repository, StoreError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(StoreError::InvalidInput("title must not be empty"));
        }
        let remote_url = request
            .remote_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());

        let now_ms = now_ms();
        let main = BranchName::main();
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO repositories(title, description, current_branch, remote_url, display_mode, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![
                title,
                request.description,
                main.as_str(),
                remote_url,
                request.display_mode.as_str(),
                now_ms
            ],
        )?;
        let id = RepoId::new(tx.last_insert_rowid());
        tx.execute(
            "INSERT INTO repo_branches(repo_id, name, created_at_ms) VALUES (?1, ?2, ?3)",
            params![id.get(), main.as_str(), now_ms],
        )?;
        tx.commit()?;

        tracing::debug!(repo = %id, "repository created");
        self.repo_get(id)
    }

    pub fn repo_get(&self, repo: RepoId) -> Result<Repository, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT title, description, current_branch, remote_url, display_mode, created_at_ms
                FROM repositories WHERE id=?1
                "#,
                params![repo.get()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;
        let Some((title, description, current, remote_url, display_mode, created_at_ms)) = row
        else {
            return Err(StoreError::UnknownRepository(repo.get()));
        };

        Ok(Repository {
            id: repo,
            title,
            description,
            current_branch: parse_branch(current)?,
            branches: self.repo_branches(repo)?,
            remote_url,
            display_mode: DisplayMode::parse(&display_mode).unwrap_or_default(),
            created_at_ms,
        })
    }

    pub fn repo_list(&self) -> Result<Vec<Repository>, StoreError> {
        let ids = {
            let mut stmt = self
                .conn
                .prepare("SELECT id FROM repositories ORDER BY id ASC")?;
            let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        ids.into_iter()
            .map(|id| self.repo_get(RepoId::new(id)))
            .collect()
    }

    pub fn repo_set_remote(
        &mut self,
        repo: RepoId,
        remote_url: Option<&str>,
    ) -> Result<Repository, StoreError> {
        let remote_url = remote_url.map(str::trim).filter(|url| !url.is_empty());
        let changed = self.conn.execute(
            "UPDATE repositories SET remote_url=?2, updated_at_ms=?3 WHERE id=?1",
            params![repo.get(), remote_url, now_ms()],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownRepository(repo.get()));
        }
        self.repo_get(repo)
    }

    /// Record `branch` in the repository's known branch list. Returns whether it was new.
    pub fn repo_add_branch(&mut self, repo: RepoId, branch: &BranchName) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        ensure_repo_tx(&tx, repo)?;
        let inserted = add_branch_tx(&tx, repo, branch)?;
        tx.commit()?;
        Ok(inserted)
    }

    pub fn repo_set_current_branch(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
    ) -> Result<Option<BranchName>, StoreError> {
        let tx = self.conn.transaction()?;
        let previous = tx
            .query_row(
                "SELECT current_branch FROM repositories WHERE id=?1",
                params![repo.get()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        let Some(previous) = previous else {
            return Err(StoreError::UnknownRepository(repo.get()));
        };
        let known = tx
            .query_row(
                "SELECT 1 FROM repo_branches WHERE repo_id=?1 AND name=?2",
                params![repo.get(), branch.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        if known.is_none() {
            return Err(StoreError::UnknownBranch(branch.to_string()));
        }
        tx.execute(
            "UPDATE repositories SET current_branch=?2, updated_at_ms=?3 WHERE id=?1",
            params![repo.get(), branch.as_str(), now_ms()],
        )?;
        tx.commit()?;
        Ok(BranchName::try_new(previous).ok())
    }

    fn repo_branches(&self, repo: RepoId) -> Result<Vec<BranchName>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM repo_branches WHERE repo_id=?1 ORDER BY rowid ASC",
        )?;
        let names = stmt
            .query_map(params![repo.get()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        names.into_iter().map(parse_branch).collect()
    }
}

/// Register `branch`. Returns false when it was already known.
pub(super) fn add_branch_tx(
    conn: &Connection,
    repo: RepoId,
    branch: &BranchName,
) -> Result<bool, StoreError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO repo_branches(repo_id, name, created_at_ms) VALUES (?1, ?2, ?3)",
        params![repo.get(), branch.as_str(), now_ms()],
    )?;
    Ok(inserted > 0)
}

fn parse_branch(raw: String) -> Result<BranchName, StoreError> {
    BranchName::try_new(raw.clone())
        .map_err(|err| StoreError::InvalidRow(format!("branch {raw:?}: {}", err.message())))
}

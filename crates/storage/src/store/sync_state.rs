#![forbid(unsafe_code)]

use super::*;
use dm_core::model::SyncState;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncRecord {
    pub state: SyncState,
    pub last_error: Option<String>,
    pub updated_at_ms: Option<i64>,
}

impl SqliteStore {
    /// Branches with no recorded transition are `clean`.
    pub fn sync_state_get(
        &self,
        repo: RepoId,
        branch: &BranchName,
    ) -> Result<SyncRecord, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT state, last_error, updated_at_ms FROM branch_sync WHERE repo_id=?1 AND branch=?2",
                params![repo.get(), branch.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((state, last_error, updated_at_ms)) = row else {
            return Ok(SyncRecord::default());
        };
        let state = SyncState::parse(&state)
            .ok_or_else(|| StoreError::InvalidRow(format!("sync state {state:?}")))?;
        Ok(SyncRecord {
            state,
            last_error,
            updated_at_ms: Some(updated_at_ms),
        })
    }

    /// Record a transition. `last_error` is only kept for `unsynced`.
    pub fn sync_state_set(
        &mut self,
        repo: RepoId,
        branch: &BranchName,
        state: SyncState,
        last_error: Option<&str>,
    ) -> Result<(), StoreError> {
        let last_error = match state {
            SyncState::Unsynced => last_error,
            _ => None,
        };
        self.conn.execute(
            r#"
            INSERT INTO branch_sync(repo_id, branch, state, last_error, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(repo_id, branch) DO UPDATE SET
              state=excluded.state,
              last_error=excluded.last_error,
              updated_at_ms=excluded.updated_at_ms
            "#,
            params![
                repo.get(),
                branch.as_str(),
                state.as_str(),
                last_error,
                now_ms()
            ],
        )?;
        Ok(())
    }
}

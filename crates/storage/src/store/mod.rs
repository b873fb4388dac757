#![forbid(unsafe_code)]

mod blocks;
mod branches;
mod docs;
mod error;
mod repos;
mod schema;
mod search;
mod structure;
mod sync_state;

pub use error::StoreError;
pub use search::SearchHit;
pub use sync_state::SyncRecord;

use dm_core::ids::{BranchName, RepoId};
use dm_core::model::{Block, DisplayMode, Doc, NodeKind};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;

const DB_FILE: &str = "docmirror.db";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

#[derive(Clone, Debug, Default)]
pub struct NewRepository {
    pub title: String,
    pub description: String,
    pub remote_url: Option<String>,
    pub display_mode: DisplayMode,
}

#[derive(Clone, Debug, Default)]
pub struct NewDoc {
    pub parent_id: Option<i64>,
    pub title: String,
    pub body: String,
    /// Appended after the last sibling when absent.
    pub order: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct NewBlock {
    pub doc_id: i64,
    pub title: String,
    pub body: String,
    pub order: Option<i64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BranchCounts {
    pub docs: usize,
    pub blocks: usize,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\nPRAGMA synchronous=NORMAL;\nPRAGMA foreign_keys=ON;",
        )?;
        schema::install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Docs and blocks currently stored for one branch.
    pub fn branch_counts(&self, repo: RepoId, branch: &BranchName) -> Result<BranchCounts, StoreError> {
        let count = |table: &str| -> Result<usize, StoreError> {
            let n: i64 = self.conn.query_row(
                &format!("SELECT COUNT(1) FROM {table} WHERE repo_id=?1 AND branch=?2"),
                params![repo.get(), branch.as_str()],
                |row| row.get(0),
            )?;
            Ok(usize::try_from(n).unwrap_or_default())
        };
        Ok(BranchCounts {
            docs: count("docs")?,
            blocks: count("blocks")?,
        })
    }
}

fn now_ms() -> i64 {
    let ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(ms).unwrap_or(i64::MAX).max(0)
}

fn ensure_repo_tx(tx: &Transaction<'_>, repo: RepoId) -> Result<(), StoreError> {
    let exists = tx
        .query_row(
            "SELECT 1 FROM repositories WHERE id=?1",
            params![repo.get()],
            |_| Ok(()),
        )
        .optional()?;
    match exists {
        Some(()) => Ok(()),
        None => Err(StoreError::UnknownRepository(repo.get())),
    }
}

/// Next id from the per-repository counter for `kind`. Ids are shared by every branch
/// of the repository, so a cloned node never reuses an id from its source branch.
fn allocate_id_tx(tx: &Transaction<'_>, repo: RepoId, kind: NodeKind) -> Result<i64, StoreError> {
    let current = tx
        .query_row(
            "SELECT next_id FROM id_counters WHERE repo_id=?1 AND kind=?2",
            params![repo.get(), kind.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    let id = match current {
        Some(next) => next,
        None => {
            // First allocation for this repository: continue after any rows already present.
            let table = match kind {
                NodeKind::Doc => "docs",
                NodeKind::Block => "blocks",
            };
            let max: Option<i64> = tx.query_row(
                &format!("SELECT MAX(id) FROM {table} WHERE repo_id=?1"),
                params![repo.get()],
                |row| row.get(0),
            )?;
            max.unwrap_or(0) + 1
        }
    };
    tx.execute(
        r#"
        INSERT INTO id_counters(repo_id, kind, next_id) VALUES (?1, ?2, ?3)
        ON CONFLICT(repo_id, kind) DO UPDATE SET next_id=excluded.next_id
        "#,
        params![repo.get(), kind.as_str(), id + 1],
    )?;
    Ok(id)
}

const DOC_COLUMNS: &str = "id, parent_id, title, body, sort_order, path, updated_at_ms";
const BLOCK_COLUMNS: &str = "id, doc_id, title, body, sort_order, updated_at_ms";

fn doc_from_row(row: &Row<'_>, repo: RepoId, branch: &BranchName) -> rusqlite::Result<Doc> {
    Ok(Doc {
        id: row.get(0)?,
        repo_id: repo,
        branch: branch.clone(),
        parent_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        order: row.get(4)?,
        path: row.get(5)?,
        updated_at_ms: row.get(6)?,
    })
}

fn block_from_row(row: &Row<'_>, repo: RepoId, branch: &BranchName) -> rusqlite::Result<Block> {
    Ok(Block {
        id: row.get(0)?,
        repo_id: repo,
        branch: branch.clone(),
        doc_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        order: row.get(4)?,
        updated_at_ms: row.get(5)?,
    })
}

fn doc_get_tx(
    conn: &Connection,
    repo: RepoId,
    branch: &BranchName,
    id: i64,
) -> Result<Option<Doc>, StoreError> {
    Ok(conn
        .query_row(
            &format!("SELECT {DOC_COLUMNS} FROM docs WHERE repo_id=?1 AND branch=?2 AND id=?3"),
            params![repo.get(), branch.as_str(), id],
            |row| doc_from_row(row, repo, branch),
        )
        .optional()?)
}

fn docs_list_tx(
    conn: &Connection,
    repo: RepoId,
    branch: &BranchName,
) -> Result<Vec<Doc>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOC_COLUMNS} FROM docs WHERE repo_id=?1 AND branch=?2 ORDER BY sort_order ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![repo.get(), branch.as_str()], |row| {
        doc_from_row(row, repo, branch)
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn blocks_list_tx(
    conn: &Connection,
    repo: RepoId,
    branch: &BranchName,
) -> Result<Vec<Block>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BLOCK_COLUMNS} FROM blocks WHERE repo_id=?1 AND branch=?2 ORDER BY doc_id ASC, sort_order ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![repo.get(), branch.as_str()], |row| {
        block_from_row(row, repo, branch)
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

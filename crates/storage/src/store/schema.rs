#![forbid(unsafe_code)]

use super::StoreError;
use rusqlite::{Connection, params};

const SCHEMA_VERSION: &str = "1";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS repositories (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  description TEXT NOT NULL DEFAULT '',
  current_branch TEXT NOT NULL DEFAULT 'main',
  remote_url TEXT,
  display_mode TEXT NOT NULL DEFAULT 'tree',
  created_at_ms INTEGER NOT NULL,
  updated_at_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS repo_branches (
  repo_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
  name TEXT NOT NULL,
  created_at_ms INTEGER NOT NULL,
  PRIMARY KEY (repo_id, name)
);

CREATE TABLE IF NOT EXISTS id_counters (
  repo_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
  kind TEXT NOT NULL,
  next_id INTEGER NOT NULL,
  PRIMARY KEY (repo_id, kind)
);

CREATE TABLE IF NOT EXISTS docs (
  repo_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
  id INTEGER NOT NULL,
  branch TEXT NOT NULL,
  parent_id INTEGER,
  title TEXT NOT NULL,
  body TEXT NOT NULL DEFAULT '',
  sort_order INTEGER NOT NULL DEFAULT 0,
  path TEXT NOT NULL,
  created_at_ms INTEGER NOT NULL,
  updated_at_ms INTEGER NOT NULL,
  PRIMARY KEY (repo_id, id)
);
CREATE INDEX IF NOT EXISTS docs_by_parent ON docs(repo_id, branch, parent_id, sort_order, id);
CREATE UNIQUE INDEX IF NOT EXISTS docs_by_path ON docs(repo_id, branch, path);

CREATE TABLE IF NOT EXISTS blocks (
  repo_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
  id INTEGER NOT NULL,
  branch TEXT NOT NULL,
  doc_id INTEGER NOT NULL,
  title TEXT NOT NULL,
  body TEXT NOT NULL DEFAULT '',
  sort_order INTEGER NOT NULL DEFAULT 0,
  created_at_ms INTEGER NOT NULL,
  updated_at_ms INTEGER NOT NULL,
  PRIMARY KEY (repo_id, id)
);
CREATE INDEX IF NOT EXISTS blocks_by_doc ON blocks(repo_id, branch, doc_id, sort_order, id);

CREATE TABLE IF NOT EXISTS branch_sync (
  repo_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
  branch TEXT NOT NULL,
  state TEXT NOT NULL,
  last_error TEXT,
  updated_at_ms INTEGER NOT NULL,
  PRIMARY KEY (repo_id, branch)
);
"#;

pub(super) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;
    Ok(())
}

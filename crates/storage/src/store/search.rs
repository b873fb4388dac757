#![forbid(unsafe_code)]

use super::*;

const SNIPPET_CHARS: usize = 160;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub kind: NodeKind,
    pub id: i64,
    pub title: String,
    pub snippet: String,
}

impl SqliteStore {
    /// Case-insensitive substring scan over titles and bodies of one branch. Every keyword
    /// must match. Docs come before blocks, each in id order. Returns the requested page and
    /// the total number of hits.
    pub fn search_nodes(
        &self,
        repo: RepoId,
        branch: &BranchName,
        keywords: &[String],
        kind: Option<NodeKind>,
        limit: usize,
        skip: usize,
    ) -> Result<(Vec<SearchHit>, usize), StoreError> {
        let needles: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if needles.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let kinds: &[NodeKind] = match kind {
            Some(NodeKind::Doc) => &[NodeKind::Doc],
            Some(NodeKind::Block) => &[NodeKind::Block],
            None => &[NodeKind::Doc, NodeKind::Block],
        };

        // SQLite's lower() only folds ASCII, so matching happens here.
        let mut hits = Vec::new();
        for kind in kinds {
            let table = match kind {
                NodeKind::Doc => "docs",
                NodeKind::Block => "blocks",
            };
            let mut stmt = self.conn.prepare(&format!(
                "SELECT id, title, body FROM {table} WHERE repo_id=?1 AND branch=?2 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![repo.get(), branch.as_str()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;
            for row in rows {
                let (id, title, body) = row?;
                let title_lower = title.to_lowercase();
                let body_lower = body.to_lowercase();
                let matches = needles
                    .iter()
                    .all(|n| title_lower.contains(n.as_str()) || body_lower.contains(n.as_str()));
                if !matches {
                    continue;
                }
                hits.push(SearchHit {
                    kind: *kind,
                    id,
                    snippet: snippet(&body, &body_lower, &needles[0]),
                    title,
                });
            }
        }

        let total = hits.len();
        let page = hits.into_iter().skip(skip).take(limit).collect();
        Ok((page, total))
    }
}

fn snippet(body: &str, body_lower: &str, needle: &str) -> String {
    let start = match body_lower.find(needle) {
        // Lowercasing can change char counts, so this is an approximate window.
        Some(byte) => body_lower[..byte]
            .chars()
            .count()
            .saturating_sub(SNIPPET_CHARS / 4),
        None => 0,
    };
    body.chars().skip(start).take(SNIPPET_CHARS).collect()
}

#![forbid(unsafe_code)]

//! Render one branch as a directory tree.

use dm_core::model::BranchSnapshot;
use dm_core::naming::{
    KEEP_FILE, MARKER_FILE, block_file_name, default_root_marker, sanitize_file_name,
};
use dm_core::tree::Hierarchy;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProjectionReport {
    pub docs: usize,
    pub blocks: usize,
    pub skipped_blocks: usize,
}

/// Write `snapshot` under `dest`: the repository marker at the top, one directory per doc,
/// one file per block. Existing files with the same names are overwritten.
pub fn project(snapshot: &BranchSnapshot, dest: &Path) -> std::io::Result<ProjectionReport> {
    fs::create_dir_all(dest)?;
    let repository = &snapshot.repository;
    let marker = if repository.description.trim().is_empty() {
        default_root_marker(&repository.title)
    } else {
        repository.description.clone()
    };
    fs::write(dest.join(MARKER_FILE), marker)?;

    let hierarchy = Hierarchy::build(&snapshot.docs, &snapshot.blocks);
    let mut dirs: BTreeMap<i64, PathBuf> = BTreeMap::new();
    let mut report = ProjectionReport::default();

    for entry in hierarchy.walk() {
        let doc = entry.doc;
        let parent_dir = doc
            .parent_id
            .and_then(|parent| dirs.get(&parent))
            .map(PathBuf::as_path)
            .unwrap_or(dest);
        let dir = parent_dir.join(sanitize_file_name(&doc.title));
        fs::create_dir_all(&dir)?;

        let blocks = hierarchy.blocks_of(doc.id);
        for block in blocks {
            fs::write(dir.join(block_file_name(&block.title)), &block.body)?;
        }
        // Written after the blocks so a block named like the marker cannot replace the body.
        if !doc.body.is_empty() {
            fs::write(dir.join(MARKER_FILE), &doc.body)?;
        }
        if doc.body.is_empty() && blocks.is_empty() && !hierarchy.has_children(doc.id) {
            fs::write(dir.join(KEEP_FILE), "")?;
        }

        report.docs += 1;
        report.blocks += blocks.len();
        dirs.insert(doc.id, dir);
    }

    report.skipped_blocks = hierarchy.orphan_blocks().len();
    if report.skipped_blocks > 0 {
        tracing::warn!(
            repo = %repository.id,
            branch = %snapshot.branch,
            skipped = report.skipped_blocks,
            "blocks without a doc were not projected"
        );
    }
    Ok(report)
}

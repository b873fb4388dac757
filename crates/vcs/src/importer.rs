#![forbid(unsafe_code)]

use dm_core::naming::{MARKER_FILE, block_title_from_file_name, is_hidden};
use dm_core::tree::{ImportedBlock, ImportedDoc, ImportedTree};
use std::fs;
use std::path::{Path, PathBuf};

/// Read a working tree back into a hierarchy. Top-level directories are root docs; files
/// at the top level (the repository marker) are ignored. Hidden entries, `.git` included,
/// are skipped everywhere.
pub fn import_tree(root: &Path) -> std::io::Result<ImportedTree> {
    let mut tree = ImportedTree::default();
    let mut stack: Vec<(PathBuf, usize)> = Vec::new();

    let (top_dirs, _) = list_dir(root)?;
    for (order, (name, path)) in top_dirs.into_iter().enumerate() {
        let index = push_doc(&mut tree, None, name, order);
        stack.push((path, index));
    }
    // Stack order only affects when a directory is read, not the indices already handed out.
    stack.reverse();

    while let Some((dir, doc_index)) = stack.pop() {
        let (dirs, files) = list_dir(&dir)?;

        let mut block_order = 0i64;
        for (name, path) in files {
            let body = read_lossy(&path)?;
            if name == MARKER_FILE {
                tree.docs[doc_index].body = body;
                continue;
            }
            tree.blocks.push(ImportedBlock {
                doc: doc_index,
                title: block_title_from_file_name(&name),
                body,
                order: block_order,
            });
            block_order += 1;
        }

        let mut children = Vec::with_capacity(dirs.len());
        for (order, (name, path)) in dirs.into_iter().enumerate() {
            let index = push_doc(&mut tree, Some(doc_index), name, order);
            children.push((path, index));
        }
        stack.extend(children.into_iter().rev());
    }
    Ok(tree)
}

fn push_doc(tree: &mut ImportedTree, parent: Option<usize>, title: String, order: usize) -> usize {
    tree.docs.push(ImportedDoc {
        parent,
        title,
        body: String::new(),
        order: i64::try_from(order).unwrap_or(i64::MAX),
    });
    tree.docs.len() - 1
}

type Entries = Vec<(String, PathBuf)>;

/// Non-hidden subdirectories and regular files of `dir`, each sorted by name bytes.
fn list_dir(dir: &Path) -> std::io::Result<(Entries, Entries)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            dirs.push((name, entry.path()));
        } else if file_type.is_file() {
            files.push((name, entry.path()));
        }
    }
    dirs.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    files.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    Ok((dirs, files))
}

fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

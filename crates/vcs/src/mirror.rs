#![forbid(unsafe_code)]

use dm_core::naming::VCS_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Make `target` hold exactly the contents of `source`, leaving `target/.git` alone.
pub fn replace_contents(source: &Path, target: &Path) -> std::io::Result<()> {
    fs::create_dir_all(target)?;
    for entry in fs::read_dir(target)? {
        let entry = entry?;
        if entry.file_name() == VCS_DIR {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    copy_tree(source, target)
}

fn copy_tree(source: &Path, target: &Path) -> std::io::Result<()> {
    let mut stack: Vec<(PathBuf, PathBuf)> = vec![(source.to_path_buf(), target.to_path_buf())];
    while let Some((from, to)) = stack.pop() {
        fs::create_dir_all(&to)?;
        for entry in fs::read_dir(&from)? {
            let entry = entry?;
            let name = entry.file_name();
            if name == VCS_DIR {
                continue;
            }
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                stack.push((entry.path(), to.join(&name)));
            } else if file_type.is_file() {
                fs::copy(entry.path(), to.join(&name))?;
            }
        }
    }
    Ok(())
}

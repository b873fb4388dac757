#![forbid(unsafe_code)]

//! File and directory names used when a branch is rendered into a working tree.

/// Marker file holding a doc body (or, at the root, the repository description).
pub const MARKER_FILE: &str = "README.md";
/// Extension of block files.
pub const BLOCK_EXTENSION: &str = "md";
/// Empty file that keeps an otherwise empty doc directory alive in git.
pub const KEEP_FILE: &str = ".gitkeep";
/// VCS metadata directory, never projected over and never imported.
pub const VCS_DIR: &str = ".git";

pub const UNTITLED: &str = "untitled";

const MAX_NAME_CHARS: usize = 120;

pub fn sanitize_file_name(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_control() || matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        {
            out.push('_');
        } else {
            out.push(ch);
        }
    }

    let trimmed = out.trim().trim_end_matches('.').trim_end();
    let leading_dots = trimmed.len() - trimmed.trim_start_matches('.').len();
    let mut name = "_".repeat(leading_dots);
    name.push_str(&trimmed[leading_dots..]);

    if name.chars().count() > MAX_NAME_CHARS {
        name = name.chars().take(MAX_NAME_CHARS).collect();
    }
    if name.is_empty() {
        return UNTITLED.to_string();
    }
    name
}

pub fn block_file_name(title: &str) -> String {
    format!("{}.{BLOCK_EXTENSION}", sanitize_file_name(title))
}

/// Title recovered from a block file name: everything before the last extension.
pub fn block_title_from_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}

pub fn default_root_marker(title: &str) -> String {
    format!("# {}\n", title.trim())
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

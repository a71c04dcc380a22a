use std::path::{Component, Path, PathBuf};

use crate::error::{SyncError, SyncResult};

/// Joins a vault-relative path onto the vault root, refusing anything that
/// could escape it.
pub fn join_under(root: &Path, rel: &Path) -> SyncResult<PathBuf> {
    if rel.is_absolute() {
        return Err(SyncError::Config(format!(
            "vault path must be relative: {}",
            rel.display()
        )));
    }

    for c in rel.components() {
        match c {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(SyncError::Config(format!(
                    "vault path must not contain '..': {}",
                    rel.display()
                )))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(SyncError::Config(format!(
                    "invalid vault path component: {}",
                    rel.display()
                )))
            }
        }
    }

    Ok(root.join(rel))
}

/// Normalizes a slash-separated vault path: trims surrounding slashes and
/// whitespace, collapses empty segments, drops `.` segments.
pub fn normalize_vault_path(raw: &str) -> String {
    raw.trim()
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

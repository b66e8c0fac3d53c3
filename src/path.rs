//! Lexical path utilities shared by manifest loading, mapping and graph
//! resolution.
//!
//! Nodes in the graph are identified by project directory, so two spellings
//! of the same directory (`/ws/App/../Core` and `/ws/Core`) must collapse to
//! one before they are compared. Nothing here touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Removes `.` components and folds `..` into its parent.
///
/// `..` at the root stays at the root; leading `..` of a relative path is
/// kept since there is nothing to fold it into.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// `path` resolved against `base` and normalized. Absolute paths ignore
/// `base`.
pub fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

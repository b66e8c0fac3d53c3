//! Applies the side effects collected from the mapper pipeline.
//!
//! Mappers describe files and directories; this is the only place they are
//! created or removed. Descriptors are applied in order, so a directory
//! descriptor emitted before a file inside it is created first.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};
use crate::mappers::{DescriptorState, SideEffectDescriptor};

/// Writes side-effect descriptors to the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct SideEffectExecutor;

impl SideEffectExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Applies every descriptor in order, stopping at the first failure.
    pub fn execute(&self, side_effects: &[SideEffectDescriptor]) -> Result<()> {
        for side_effect in side_effects {
            debug!("Side effect: {}", side_effect);
            self.apply(side_effect)?;
        }
        Ok(())
    }

    fn apply(&self, side_effect: &SideEffectDescriptor) -> Result<()> {
        match side_effect {
            SideEffectDescriptor::File {
                path,
                contents,
                state: DescriptorState::Present,
            } => {
                if let Some(parent) = path.parent() {
                    create_directory(parent)?;
                }
                let contents = contents.as_deref().unwrap_or_default();
                fs::write(path, contents).map_err(|e| Error::Filesystem {
                    message: format!("Failed to write file '{}': {}", path.display(), e),
                })
            }
            SideEffectDescriptor::File {
                path,
                state: DescriptorState::Absent,
                ..
            } => ignore_missing(fs::remove_file(path), "remove file", path),
            SideEffectDescriptor::Directory {
                path,
                state: DescriptorState::Present,
            } => create_directory(path),
            SideEffectDescriptor::Directory {
                path,
                state: DescriptorState::Absent,
            } => ignore_missing(fs::remove_dir_all(path), "remove directory", path),
        }
    }
}

fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::Filesystem {
        message: format!("Failed to create directory '{}': {}", path.display(), e),
    })
}

fn ignore_missing(result: std::io::Result<()>, action: &str, path: &Path) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Filesystem {
            message: format!("Failed to {} '{}': {}", action, path.display(), e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_file_with_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Derived/InfoPlists/App.plist");

        SideEffectExecutor::new()
            .execute(&[SideEffectDescriptor::file(&path, "<plist/>")])
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<plist/>");
    }

    #[test]
    fn test_file_without_contents_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.txt");

        SideEffectExecutor::new()
            .execute(&[SideEffectDescriptor::File {
                path: path.clone(),
                contents: None,
                state: DescriptorState::Present,
            }])
            .unwrap();

        assert_eq!(fs::read(&path).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_creates_and_removes_directories() {
        let temp_dir = TempDir::new().unwrap();
        let derived = temp_dir.path().join("App/Derived");
        let executor = SideEffectExecutor::new();

        executor
            .execute(&[
                SideEffectDescriptor::directory(&derived),
                SideEffectDescriptor::file(derived.join("Sources/A.swift"), "// a"),
            ])
            .unwrap();
        assert!(derived.join("Sources/A.swift").exists());

        executor
            .execute(&[SideEffectDescriptor::Directory {
                path: derived.clone(),
                state: DescriptorState::Absent,
            }])
            .unwrap();
        assert!(!derived.exists());
    }

    #[test]
    fn test_removing_missing_paths_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SideEffectExecutor::new();

        executor
            .execute(&[
                SideEffectDescriptor::File {
                    path: temp_dir.path().join("missing.txt"),
                    contents: None,
                    state: DescriptorState::Absent,
                },
                SideEffectDescriptor::Directory {
                    path: temp_dir.path().join("missing"),
                    state: DescriptorState::Absent,
                },
            ])
            .unwrap();
    }

    #[test]
    fn test_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stale.swift");
        fs::write(&path, "old").unwrap();

        SideEffectExecutor::new()
            .execute(&[SideEffectDescriptor::File {
                path: path.clone(),
                contents: None,
                state: DescriptorState::Absent,
            }])
            .unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_write_failure_is_filesystem_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();

        let err = SideEffectExecutor::new()
            .execute(&[SideEffectDescriptor::file(blocker.join("child.txt"), "x")])
            .unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }
}

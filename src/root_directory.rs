//! Locating the root directory of a workspace.
//!
//! The root is the closest ancestor (or the path itself) that contains one
//! of the marker entries. Lookups are memoized per path in a shared map so
//! that resolving many manifests under one root walks the tree once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::defaults::{CONFIG_FILE_NAME, DATA_DIRECTORY_NAME};
use crate::error::{Error, Result};
use crate::filesystem::{FileSystem, LocalFileSystem};

/// Entries that mark a directory as a root, in priority order.
const ROOT_MARKERS: [&str; 3] = [DATA_DIRECTORY_NAME, CONFIG_FILE_NAME, ".git"];

/// Finds workspace roots, caching every path visited on the way up.
#[derive(Debug, Clone)]
pub struct RootDirectoryLocator {
    fs: Arc<dyn FileSystem>,
    cache: Arc<Mutex<HashMap<PathBuf, PathBuf>>>,
}

impl RootDirectoryLocator {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the root directory containing `path`, or `None` when no
    /// ancestor carries a marker.
    pub fn locate(&self, path: &Path) -> Result<Option<PathBuf>> {
        let mut visited = Vec::new();
        let mut current = Some(path);

        while let Some(directory) = current {
            if let Some(root) = self.cached(directory)? {
                self.remember(&visited, &root)?;
                return Ok(Some(root));
            }
            if self.is_root(directory) {
                let root = directory.to_path_buf();
                visited.push(root.clone());
                self.remember(&visited, &root)?;
                debug!("Located root {} for {}", root.display(), path.display());
                return Ok(Some(root));
            }
            visited.push(directory.to_path_buf());
            current = directory.parent();
        }

        debug!("No root directory found for {}", path.display());
        Ok(None)
    }

    fn is_root(&self, directory: &Path) -> bool {
        ROOT_MARKERS
            .iter()
            .any(|marker| self.fs.exists(&directory.join(marker)))
    }

    fn cached(&self, path: &Path) -> Result<Option<PathBuf>> {
        let cache = self.cache.lock().map_err(|_| Error::LockPoisoned {
            context: "root directory cache".to_string(),
        })?;
        Ok(cache.get(path).cloned())
    }

    fn remember(&self, paths: &[PathBuf], root: &Path) -> Result<()> {
        let mut cache = self.cache.lock().map_err(|_| Error::LockPoisoned {
            context: "root directory cache".to_string(),
        })?;
        for path in paths {
            cache.insert(path.clone(), root.to_path_buf());
        }
        Ok(())
    }

    /// Number of memoized paths.
    pub fn cached_paths(&self) -> Result<usize> {
        let cache = self.cache.lock().map_err(|_| Error::LockPoisoned {
            context: "root directory cache".to_string(),
        })?;
        Ok(cache.len())
    }
}

impl Default for RootDirectoryLocator {
    fn default() -> Self {
        Self::new(Arc::new(LocalFileSystem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFS;
    use std::thread;

    fn locator(fs: MemoryFS) -> RootDirectoryLocator {
        RootDirectoryLocator::new(Arc::new(fs))
    }

    #[test]
    fn test_locates_config_file_root() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("/ws/.graphsmith.yaml", "cache: {}");
        fs.add_file_string("/ws/App/Sources/App.swift", "");

        let root = locator(fs)
            .locate(Path::new("/ws/App/Sources"))
            .unwrap();
        assert_eq!(root, Some(PathBuf::from("/ws")));
    }

    #[test]
    fn test_closest_marker_wins() {
        let mut fs = MemoryFS::new();
        fs.add_directory("/repo/.git");
        fs.add_directory("/repo/ws/.graphsmith");
        fs.add_file_string("/repo/ws/App/main.swift", "");

        let root = locator(fs).locate(Path::new("/repo/ws/App")).unwrap();
        assert_eq!(root, Some(PathBuf::from("/repo/ws")));
    }

    #[test]
    fn test_no_marker_returns_none() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("/plain/App/main.swift", "");

        assert_eq!(locator(fs).locate(Path::new("/plain/App")).unwrap(), None);
    }

    #[test]
    fn test_visited_paths_are_memoized() {
        let mut fs = MemoryFS::new();
        fs.add_directory("/ws/.git");
        fs.add_file_string("/ws/A/B/C/file.swift", "");
        let locator = locator(fs);

        locator.locate(Path::new("/ws/A/B/C")).unwrap();
        // C, B, A and the root itself.
        assert_eq!(locator.cached_paths().unwrap(), 4);

        let root = locator.locate(Path::new("/ws/A/B")).unwrap();
        assert_eq!(root, Some(PathBuf::from("/ws")));
        assert_eq!(locator.cached_paths().unwrap(), 4);
    }

    #[test]
    fn test_concurrent_lookups_share_the_cache() {
        let mut fs = MemoryFS::new();
        fs.add_directory("/ws/.graphsmith");
        for name in ["A", "B", "C", "D"] {
            fs.add_file_string(format!("/ws/{}/main.swift", name), "");
        }
        let locator = locator(fs);

        let handles: Vec<_> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|name| {
                let locator = locator.clone();
                thread::spawn(move || locator.locate(&PathBuf::from("/ws").join(name)))
            })
            .collect();
        for handle in handles {
            assert_eq!(
                handle.join().unwrap().unwrap(),
                Some(PathBuf::from("/ws"))
            );
        }
        assert_eq!(locator.cached_paths().unwrap(), 5);
    }

    #[test]
    fn test_local_filesystem_git_root() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join(".git")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("App/Sources")).unwrap();

        let root = RootDirectoryLocator::default()
            .locate(&temp_dir.path().join("App/Sources"))
            .unwrap();
        assert_eq!(root, Some(temp_dir.path().to_path_buf()));
    }
}

//! On-disk content-addressed cache.
//!
//! Layout: `<root>/<Category>/<hash>/<name>.<ext>`, where `<ext>` is one of
//! the artifact extensions (`framework`, `xcframework`, `a`, `bundle`).
//! Artifacts are copied into a staging directory first and each one is then
//! renamed into its entry, so readers never observe a partial artifact.
//! Publishing an artifact replaces only the artifact with the same file
//! name; other artifacts sharing the hash are left alone.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, warn};
use tempfile::TempDir;
use walkdir::WalkDir;

use super::{CacheCategory, CacheStorableItem, CacheStoring, StorageFuture};
use crate::error::{Error, Result};
use crate::graph::ArtifactKind;

#[derive(Debug, Clone)]
pub struct CacheLocalStorage {
    root: PathBuf,
}

/// One `<Category>/<hash>` directory of the local cache.
#[derive(Debug, Clone)]
pub struct LocalCacheEntry {
    pub category: CacheCategory,
    pub hash: String,
    pub artifacts: Vec<PathBuf>,
    pub size: u64,
    pub last_modified: Option<SystemTime>,
    pub dir_path: PathBuf,
}

impl CacheLocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_directory(&self, category: CacheCategory) -> PathBuf {
        self.root.join(category.directory_name())
    }

    pub fn entry_directory(&self, category: CacheCategory, hash: &str) -> PathBuf {
        self.category_directory(category).join(hash)
    }

    /// The artifact stored for `item`, if any. The artifact's file stem must
    /// equal the item name.
    pub fn lookup(&self, item: &CacheStorableItem, category: CacheCategory) -> Option<PathBuf> {
        let directory = self.entry_directory(category, &item.hash);
        let entries = fs::read_dir(&directory).ok()?;
        entries
            .flatten()
            .map(|entry| entry.path())
            .find(|path| is_artifact_named(path, &item.name))
    }

    /// Creates an empty staging directory next to the entries of `category`.
    pub fn staging_directory(&self, category: CacheCategory) -> Result<TempDir> {
        let parent = self.category_directory(category);
        fs::create_dir_all(&parent)?;
        tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&parent)
            .map_err(Error::from)
    }

    /// Moves every artifact of a fully populated staging directory into the
    /// entry for `hash`. Each artifact replaces only a previous artifact with
    /// the same file name. The emptied staging directory is removed on drop.
    pub fn publish(&self, category: CacheCategory, hash: &str, staged: TempDir) -> Result<PathBuf> {
        let destination = self.entry_directory(category, hash);
        fs::create_dir_all(&destination)?;
        for entry in fs::read_dir(staged.path())? {
            let source = entry?.path();
            let Some(name) = source.file_name() else {
                continue;
            };
            move_into_place(&source, &destination.join(name))?;
        }
        Ok(destination)
    }

    fn fetch_sync(
        &self,
        items: &HashSet<CacheStorableItem>,
        category: CacheCategory,
    ) -> HashMap<CacheStorableItem, PathBuf> {
        items
            .iter()
            .filter_map(|item| {
                let path = self.lookup(item, category)?;
                debug!("Local cache hit for {}: {}", item, path.display());
                Some((item.clone(), path))
            })
            .collect()
    }

    fn store_item(
        &self,
        item: &CacheStorableItem,
        paths: &[PathBuf],
        category: CacheCategory,
    ) -> Result<PathBuf> {
        let staged = self.staging_directory(category)?;
        for path in paths {
            let name = path.file_name().ok_or_else(|| Error::Storage {
                message: format!("Artifact path has no file name: {}", path.display()),
            })?;
            copy_recursively(path, &staged.path().join(name))?;
        }
        self.publish(category, &item.hash, staged)
    }

    fn store_sync(
        &self,
        items: &HashMap<CacheStorableItem, Vec<PathBuf>>,
        category: CacheCategory,
    ) -> Vec<CacheStorableItem> {
        let mut stored = Vec::new();
        for (item, paths) in items {
            match self.store_item(item, paths, category) {
                Ok(path) => {
                    debug!("Stored {} at {}", item, path.display());
                    stored.push(item.clone());
                }
                Err(e) => warn!("Failed to store {} in local cache: {}", item, e),
            }
        }
        stored.sort();
        stored
    }

    /// Every entry directory, sorted by category and hash.
    pub fn entries(&self) -> Result<Vec<LocalCacheEntry>> {
        let mut entries = Vec::new();
        for category in CacheCategory::ALL {
            let directory = self.category_directory(category);
            if !directory.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&directory)? {
                let dir_path = entry?.path();
                let Some(hash) = dir_path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if hash.starts_with('.') || !dir_path.is_dir() {
                    continue;
                }
                let mut artifacts: Vec<PathBuf> = fs::read_dir(&dir_path)?
                    .flatten()
                    .map(|e| e.path())
                    .collect();
                artifacts.sort();
                let (size, last_modified) = directory_info(&dir_path);
                entries.push(LocalCacheEntry {
                    category,
                    hash: hash.to_string(),
                    artifacts,
                    size,
                    last_modified,
                    dir_path: dir_path.clone(),
                });
            }
        }
        entries.sort_by(|a, b| {
            (a.category.directory_name(), &a.hash).cmp(&(b.category.directory_name(), &b.hash))
        });
        Ok(entries)
    }

    /// Removes every entry. Returns the removed entries.
    pub fn clean(&self) -> Result<Vec<LocalCacheEntry>> {
        let entries = self.entries()?;
        for category in CacheCategory::ALL {
            let directory = self.category_directory(category);
            if directory.exists() {
                fs::remove_dir_all(&directory)?;
            }
        }
        Ok(entries)
    }
}

impl CacheStoring for CacheLocalStorage {
    fn fetch<'a>(
        &'a self,
        items: &'a HashSet<CacheStorableItem>,
        category: CacheCategory,
    ) -> StorageFuture<'a, HashMap<CacheStorableItem, PathBuf>> {
        let storage = self.clone();
        let items = items.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || storage.fetch_sync(&items, category))
                .await
                .map_err(task_failed)
        })
    }

    fn store<'a>(
        &'a self,
        items: &'a HashMap<CacheStorableItem, Vec<PathBuf>>,
        category: CacheCategory,
    ) -> StorageFuture<'a, Vec<CacheStorableItem>> {
        let storage = self.clone();
        let items = items.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || storage.store_sync(&items, category))
                .await
                .map_err(task_failed)
        })
    }
}

fn task_failed(e: tokio::task::JoinError) -> Error {
    Error::Storage {
        message: format!("Local cache task failed: {}", e),
    }
}

/// Renames `source` over `target`, removing a previous artifact at `target`.
fn move_into_place(source: &Path, target: &Path) -> Result<()> {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => ignore_missing(fs::remove_dir_all(target))?,
        Ok(_) => ignore_missing(fs::remove_file(target))?,
        Err(_) => {}
    }
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        // Another writer published the same artifact between removal and rename.
        Err(_) if target.exists() => Ok(()),
        Err(e) => Err(Error::Storage {
            message: format!(
                "Failed to publish '{}' to '{}': {}",
                source.display(),
                target.display(),
                e
            ),
        }),
    }
}

fn ignore_missing(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn is_artifact_named(path: &Path, name: &str) -> bool {
    let stem_matches = path.file_stem().and_then(|s| s.to_str()) == Some(name);
    let extension_known = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ArtifactKind::EXTENSIONS.contains(&ext));
    stem_matches && extension_known
}

fn copy_recursively(source: &Path, destination: &Path) -> Result<()> {
    if source.is_file() {
        fs::copy(source, destination)?;
        return Ok(());
    }
    if !source.is_dir() {
        return Err(Error::FileNotFound {
            path: source.to_path_buf(),
        });
    }
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| Error::Filesystem {
            message: format!("Failed to walk '{}': {}", source.display(), e),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::Filesystem {
                message: e.to_string(),
            })?;
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Total file size and latest modification time under `dir_path`.
fn directory_info(dir_path: &Path) -> (u64, Option<SystemTime>) {
    let mut total_size = 0u64;
    let mut latest_mtime = None;

    for entry in WalkDir::new(dir_path).into_iter().flatten() {
        if let Ok(meta) = entry.metadata() {
            if meta.is_file() {
                total_size += meta.len();
                if let Ok(mtime) = meta.modified() {
                    latest_mtime = Some(
                        latest_mtime
                            .map(|prev: SystemTime| prev.max(mtime))
                            .unwrap_or(mtime),
                    );
                }
            }
        }
    }

    (total_size, latest_mtime)
}

//! Filesystem abstraction used by hashing and root-directory lookup.
//!
//! Two implementations are provided: [`LocalFileSystem`], which reads the
//! host filesystem, and [`MemoryFS`], an in-memory tree used by tests and
//! dry runs. Directories in a `MemoryFS` are implicit: any ancestor of a
//! stored file is a directory, and empty directories can be added
//! explicitly.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Read-only view of a filesystem.
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// Returns true if a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` is a directory.
    fn is_directory(&self, path: &Path) -> bool;

    /// Reads the full contents of the file at `path`.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Lists the immediate entries of `directory` as full paths.
    ///
    /// Order is unspecified; callers that need determinism sort the result.
    fn enumerate(&self, directory: &Path) -> Result<Vec<PathBuf>>;
}

/// The host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Filesystem {
                message: format!("Failed to read '{}': {}", path.display(), e),
            },
        })
    }

    fn enumerate(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(directory).map_err(|e| Error::Filesystem {
            message: format!("Failed to list '{}': {}", directory.display(), e),
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

/// Represents a file held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Get file size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// In-memory filesystem
#[derive(Debug, Clone, Default)]
pub struct MemoryFS {
    /// Files stored as path -> content mapping
    files: HashMap<PathBuf, File>,
    /// Directories added explicitly (possibly empty)
    directories: HashSet<PathBuf>,
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a file
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, file: File) {
        self.files.insert(path.as_ref().to_path_buf(), file);
    }

    /// Add a file with content
    pub fn add_file_content<P: AsRef<Path>>(&mut self, path: P, content: Vec<u8>) {
        self.add_file(path, File::new(content))
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) {
        self.add_file(path, File::from_string(content))
    }

    /// Add an empty directory
    pub fn add_directory<P: AsRef<Path>>(&mut self, path: P) {
        self.directories.insert(path.as_ref().to_path_buf());
    }

    /// Get a file by path
    pub fn get_file<P: AsRef<Path>>(&self, path: P) -> Option<&File> {
        self.files.get(path.as_ref())
    }

    /// Remove a file
    pub fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Option<File> {
        self.files.remove(path.as_ref())
    }

    /// List all files
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if filesystem is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }

    /// Iterate over all files as (path, file) pairs
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &File)> {
        self.files.iter()
    }

    fn all_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys().chain(self.directories.iter())
    }
}

impl FileSystem for MemoryFS {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.is_directory(path)
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.directories.contains(path)
            || self
                .all_paths()
                .any(|candidate| candidate != path && candidate.starts_with(path))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .map(|file| file.content.clone())
            .ok_or_else(|| Error::FileNotFound {
                path: path.to_path_buf(),
            })
    }

    fn enumerate(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        if !self.is_directory(directory) {
            return Err(Error::Filesystem {
                message: format!("Not a directory: {}", directory.display()),
            });
        }
        let entries: BTreeSet<PathBuf> = self
            .all_paths()
            .filter_map(|candidate| candidate.strip_prefix(directory).ok())
            .filter_map(|relative| relative.components().next())
            .map(|first| directory.join(first))
            .collect();
        Ok(entries.into_iter().collect())
    }
}

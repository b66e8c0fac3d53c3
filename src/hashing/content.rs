//! MD5 content digests.
//!
//! Every digest is a lowercase hex MD5 string. Composite values hash the
//! concatenation of their parts so that `["foo", "bar"]` and `"foobar"`
//! produce the same digest; maps are flattened to sorted `key:value` pairs
//! joined with `-`.
//!
//! Directories hash to the digest of their entries' digests joined with `-`,
//! entries sorted by path. Finder bookkeeping files (`.DS_Store` in any case)
//! are skipped so that browsing a folder does not invalidate the cache.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use md5::{Digest, Md5};

use crate::error::{Error, Result};
use crate::filesystem::{FileSystem, LocalFileSystem};

const DS_STORE: &str = ".ds_store";

/// Digest operations over bytes, strings and paths.
pub trait ContentHashing: Send + Sync {
    fn hash_bytes(&self, bytes: &[u8]) -> String;

    fn hash(&self, string: &str) -> String {
        self.hash_bytes(string.as_bytes())
    }

    fn hash_strings(&self, strings: &[String]) -> String {
        self.hash(&strings.concat())
    }

    fn hash_dict(&self, dict: &BTreeMap<String, String>) -> String {
        let pairs: Vec<String> = dict
            .iter()
            .map(|(key, value)| format!("{}:{}", key, value))
            .collect();
        self.hash(&pairs.join("-"))
    }

    /// Digest of a file's bytes or of a directory tree.
    fn hash_path(&self, path: &Path) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct ContentHasher {
    fs: Arc<dyn FileSystem>,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(Arc::new(LocalFileSystem))
    }
}

impl ContentHasher {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    fn hash_directory(&self, directory: &Path) -> Result<String> {
        let mut entries = self.fs.enumerate(directory)?;
        entries.retain(|entry| !is_bookkeeping_file(entry));
        entries.sort();

        let mut digests = Vec::with_capacity(entries.len());
        for entry in entries {
            digests.push(self.hash_path(&entry)?);
        }
        Ok(self.hash(&digests.join("-")))
    }
}

impl ContentHashing for ContentHasher {
    fn hash_bytes(&self, bytes: &[u8]) -> String {
        let mut hasher = Md5::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    fn hash_path(&self, path: &Path) -> Result<String> {
        if !self.fs.exists(path) {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        if self.fs.is_directory(path) {
            self.hash_directory(path)
        } else {
            let bytes = self.fs.read(path)?;
            Ok(self.hash_bytes(&bytes))
        }
    }
}

fn is_bookkeeping_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(DS_STORE))
}

//! # Cache Storage
//!
//! Content-addressed storage for build artifacts. Artifacts are keyed by a
//! [`CacheStorableItem`], the pair of a target's content hash and its name,
//! inside a [`CacheCategory`].
//!
//! ## Backends
//!
//! - [`CacheLocalStorage`]: a directory tree
//!   `<root>/<Category>/<hash>/<name>.<ext>`.
//! - [`CacheRemoteStorage`]: an HTTP service, artifacts transferred as zip
//!   archives and published into a local storage on download.
//! - [`CacheStorage`]: local first, then remote for whatever is missing.
//! - [`EmptyCacheStorage`]: never hits; used when the binary cache is off.
//!
//! All backends implement [`CacheStoring`]. Its methods return boxed futures
//! so the trait stays object safe and backends can be composed as
//! `Arc<dyn CacheStoring>`.
//!
//! A failure to fetch or store one item never fails the whole batch: the
//! item is logged and left out of the result, which callers treat as a miss.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod archive;
pub mod combined;
pub mod empty;
pub mod local;
pub mod remote;

pub use combined::CacheStorage;
pub use empty::EmptyCacheStorage;
pub use local::{CacheLocalStorage, LocalCacheEntry};
pub use remote::{CacheRemoteStorage, RemoteCacheSettings};

/// Boxed future returned by [`CacheStoring`] methods.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Data recorded alongside a stored artifact. Not part of its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheItemMetadata {
    /// How long building the artifact took, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_duration_ms: Option<u64>,
}

/// Key of one cached artifact.
///
/// Equality, ordering and hashing only consider `(hash, name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStorableItem {
    pub name: String,
    pub hash: String,
    #[serde(default)]
    pub metadata: CacheItemMetadata,
}

impl CacheStorableItem {
    pub fn new(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
            metadata: CacheItemMetadata::default(),
        }
    }

    pub fn with_build_duration(mut self, millis: u64) -> Self {
        self.metadata.build_duration_ms = Some(millis);
        self
    }

    fn key(&self) -> (&str, &str) {
        (&self.hash, &self.name)
    }
}

impl PartialEq for CacheStorableItem {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CacheStorableItem {}

impl Hash for CacheStorableItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for CacheStorableItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CacheStorableItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for CacheStorableItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.hash)
    }
}

/// Sub-namespace of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    Binaries,
    SelectiveTests,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 2] = [CacheCategory::Binaries, CacheCategory::SelectiveTests];

    /// Directory name in the local layout.
    pub fn directory_name(&self) -> &'static str {
        match self {
            CacheCategory::Binaries => "Binaries",
            CacheCategory::SelectiveTests => "SelectiveTests",
        }
    }

    /// Path segment in remote URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::Binaries => "binaries",
            CacheCategory::SelectiveTests => "selective_tests",
        }
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cache backend.
pub trait CacheStoring: Send + Sync + fmt::Debug {
    /// Looks up `items`. Hits map to a local artifact path; misses are
    /// absent from the result.
    fn fetch<'a>(
        &'a self,
        items: &'a HashSet<CacheStorableItem>,
        category: CacheCategory,
    ) -> StorageFuture<'a, HashMap<CacheStorableItem, PathBuf>>;

    /// Stores the artifacts at the given paths under each item. Returns the
    /// items that were stored.
    fn store<'a>(
        &'a self,
        items: &'a HashMap<CacheStorableItem, Vec<PathBuf>>,
        category: CacheCategory,
    ) -> StorageFuture<'a, Vec<CacheStorableItem>>;
}

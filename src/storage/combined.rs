//! Local storage backed by an optional remote.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use log::{debug, warn};

use super::{CacheCategory, CacheStorableItem, CacheStoring, StorageFuture};

/// Fetches from `local` first and asks `remote` only for the rest. Stores go
/// to both; when a remote is configured its result is the one reported,
/// since that is what other machines will see.
#[derive(Debug)]
pub struct CacheStorage {
    local: Box<dyn CacheStoring>,
    remote: Option<Box<dyn CacheStoring>>,
}

impl CacheStorage {
    pub fn new(local: Box<dyn CacheStoring>, remote: Option<Box<dyn CacheStoring>>) -> Self {
        Self { local, remote }
    }
}

impl CacheStoring for CacheStorage {
    fn fetch<'a>(
        &'a self,
        items: &'a HashSet<CacheStorableItem>,
        category: CacheCategory,
    ) -> StorageFuture<'a, HashMap<CacheStorableItem, PathBuf>> {
        Box::pin(async move {
            let mut hits = match self.local.fetch(items, category).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("Local cache lookup failed: {}", e);
                    HashMap::new()
                }
            };

            let Some(remote) = &self.remote else {
                return Ok(hits);
            };
            let remaining: HashSet<CacheStorableItem> = items
                .iter()
                .filter(|item| !hits.contains_key(*item))
                .cloned()
                .collect();
            if remaining.is_empty() {
                return Ok(hits);
            }

            debug!("Asking remote cache for {} items", remaining.len());
            match remote.fetch(&remaining, category).await {
                Ok(remote_hits) => hits.extend(remote_hits),
                Err(e) => warn!("Remote cache lookup failed: {}", e),
            }
            Ok(hits)
        })
    }

    fn store<'a>(
        &'a self,
        items: &'a HashMap<CacheStorableItem, Vec<PathBuf>>,
        category: CacheCategory,
    ) -> StorageFuture<'a, Vec<CacheStorableItem>> {
        Box::pin(async move {
            let stored_locally = match self.local.store(items, category).await {
                Ok(stored) => stored,
                Err(e) => {
                    warn!("Local cache store failed: {}", e);
                    Vec::new()
                }
            };

            let Some(remote) = &self.remote else {
                return Ok(stored_locally);
            };
            match remote.store(items, category).await {
                Ok(stored) => Ok(stored),
                Err(e) => {
                    warn!("Remote cache store failed: {}", e);
                    Ok(Vec::new())
                }
            }
        })
    }
}

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use super::{CacheCategory, CacheStorableItem, CacheStoring, StorageFuture};

/// Storage used when caching is disabled: nothing is ever found, and every
/// store reports success without writing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCacheStorage;

impl CacheStoring for EmptyCacheStorage {
    fn fetch<'a>(
        &'a self,
        _items: &'a HashSet<CacheStorableItem>,
        _category: CacheCategory,
    ) -> StorageFuture<'a, HashMap<CacheStorableItem, PathBuf>> {
        Box::pin(async { Ok(HashMap::new()) })
    }

    fn store<'a>(
        &'a self,
        items: &'a HashMap<CacheStorableItem, Vec<PathBuf>>,
        _category: CacheCategory,
    ) -> StorageFuture<'a, Vec<CacheStorableItem>> {
        Box::pin(async move {
            let mut stored: Vec<CacheStorableItem> = items.keys().cloned().collect();
            stored.sort();
            Ok(stored)
        })
    }
}

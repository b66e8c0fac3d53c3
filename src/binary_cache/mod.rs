//! # Binary Cache
//!
//! Replaces targets whose build products are already cached with the cached
//! binaries.
//!
//! [`CacheGraphMapper`] drives the process: it hashes the cacheable targets,
//! asks the storage for the matching artifacts, and hands the hits to
//! [`CacheGraphMutator`], which rewrites the graph. Storage problems never
//! fail generation; they only mean fewer hits.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{info, warn};

use crate::error::Result;
use crate::graph::{Graph, TargetReference};
use crate::hashing::{is_cacheable, GraphContentHasher};
use crate::storage::{CacheCategory, CacheStorableItem, CacheStoring};

pub mod mutator;

pub use mutator::CacheGraphMutator;

pub struct CacheGraphMapper {
    hasher: GraphContentHasher,
    storage: Arc<dyn CacheStoring>,
    sources: HashSet<String>,
    additional_strings: Vec<String>,
    category: CacheCategory,
}

impl CacheGraphMapper {
    pub fn new(hasher: GraphContentHasher, storage: Arc<dyn CacheStoring>) -> Self {
        Self {
            hasher,
            storage,
            sources: HashSet::new(),
            additional_strings: Vec::new(),
            category: CacheCategory::Binaries,
        }
    }

    /// Targets that must stay as sources even when a binary exists.
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = String>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Extra strings mixed into every target hash.
    pub fn with_additional_strings(mut self, strings: Vec<String>) -> Self {
        self.additional_strings = strings;
        self
    }

    pub fn with_category(mut self, category: CacheCategory) -> Self {
        self.category = category;
        self
    }

    pub async fn map(&self, graph: Graph) -> Result<Graph> {
        let hashes = self
            .hasher
            .content_hashes(&graph, is_cacheable, &self.additional_strings)?;

        let mut targets_by_item: HashMap<CacheStorableItem, Vec<TargetReference>> = HashMap::new();
        for (reference, hash) in hashes {
            if self.sources.contains(&reference.name) {
                continue;
            }
            let item = CacheStorableItem::new(reference.name.clone(), hash);
            targets_by_item.entry(item).or_default().push(reference);
        }
        let items: HashSet<CacheStorableItem> = targets_by_item.keys().cloned().collect();

        let hits = if items.is_empty() {
            HashMap::new()
        } else {
            match self.storage.fetch(&items, self.category).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("Binary cache lookup failed, building everything from source: {}", e);
                    HashMap::new()
                }
            }
        };
        info!(
            "Binary cache: {} hits, {} misses",
            hits.len(),
            items.len().saturating_sub(hits.len())
        );

        let mut artifacts = HashMap::new();
        for (item, path) in hits {
            for reference in targets_by_item.get(&item).into_iter().flatten() {
                artifacts.insert(reference.clone(), path.clone());
            }
        }

        CacheGraphMutator::new().map(graph, &artifacts, &self.sources)
    }
}

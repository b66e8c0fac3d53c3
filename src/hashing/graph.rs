//! Per-target content hashes over a dependency graph.
//!
//! A target's hash covers what goes into its build product: product type,
//! source and resource contents, build settings, Info.plist, and the hashes
//! of its direct dependencies. Because dependency hashes are themselves
//! content hashes, a change anywhere below a target changes the target's
//! hash. Target names and project paths are not part of the hash, so two
//! identical frameworks in different projects share a cache entry.
//!
//! Targets are processed level by level (leaves first). Within a level the
//! targets are independent and are hashed in parallel with rayon; the memo
//! of finished hashes is only extended between levels.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use super::content::ContentHashing;
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphDependency, GraphTarget, InfoPlist, SourceFile, TargetReference};

/// Default selection of targets worth hashing for the binary cache.
pub fn is_cacheable(target: &GraphTarget<'_>) -> bool {
    target.target.product.is_cacheable()
}

#[derive(Clone)]
pub struct GraphContentHasher {
    hasher: Arc<dyn ContentHashing>,
}

impl GraphContentHasher {
    pub fn new(hasher: Arc<dyn ContentHashing>) -> Self {
        Self { hasher }
    }

    /// Hashes every target selected by `include`, together with everything
    /// they depend on, and returns the hashes of the selected targets.
    ///
    /// `additional_strings` are appended to every target's hash input.
    pub fn content_hashes<F>(
        &self,
        graph: &Graph,
        include: F,
        additional_strings: &[String],
    ) -> Result<BTreeMap<TargetReference, String>>
    where
        F: Fn(&GraphTarget<'_>) -> bool,
    {
        let included: Vec<TargetReference> = graph
            .all_targets()
            .into_iter()
            .filter(|target| include(target))
            .map(|target| target.reference())
            .collect();
        let required = graph.targets_closure(&included);

        let mut memo: HashMap<TargetReference, String> = HashMap::new();
        for level in graph.target_levels()? {
            let level: Vec<&TargetReference> =
                level.iter().filter(|r| required.contains(*r)).collect();
            if level.is_empty() {
                continue;
            }
            let hashed = level
                .par_iter()
                .map(|reference| {
                    self.hash_target(graph, reference, &memo, additional_strings)
                        .map(|hash| ((*reference).clone(), hash))
                })
                .collect::<Result<Vec<_>>>()?;
            memo.extend(hashed);
        }

        debug!(
            "Hashed {} targets ({} requested)",
            memo.len(),
            included.len()
        );
        Ok(included
            .into_iter()
            .filter_map(|reference| {
                let hash = memo.get(&reference)?.clone();
                Some((reference, hash))
            })
            .collect())
    }

    fn hash_target(
        &self,
        graph: &Graph,
        reference: &TargetReference,
        memo: &HashMap<TargetReference, String>,
        additional_strings: &[String],
    ) -> Result<String> {
        let target = graph
            .target(&reference.project_path, &reference.name)
            .ok_or_else(|| Error::MissingTarget {
                name: reference.name.clone(),
                project: reference.project_path.clone(),
                referenced_by: graph.name.clone(),
            })?
            .target;

        let mut components = vec![
            target.product.as_str().to_string(),
            self.hash_sources(&target.sources)?,
            self.hash_resources(&target.resources)?,
            self.hasher.hash_dict(&target.settings),
            self.hash_info_plist(target.info_plist.as_ref())?,
            self.hash_dependencies(graph, reference, memo)?,
        ];
        components.extend(additional_strings.iter().cloned());

        Ok(self.hasher.hash(&components.join("-")))
    }

    fn hash_sources(&self, sources: &[SourceFile]) -> Result<String> {
        let mut digests = sources
            .iter()
            .map(|source| match &source.content_hash {
                Some(hash) => Ok(hash.clone()),
                None => self.hasher.hash_path(&source.path),
            })
            .collect::<Result<Vec<_>>>()?;
        digests.sort();
        Ok(self.hasher.hash_strings(&digests))
    }

    fn hash_resources(&self, resources: &[PathBuf]) -> Result<String> {
        let mut digests = resources
            .iter()
            .map(|path| self.hasher.hash_path(path))
            .collect::<Result<Vec<_>>>()?;
        digests.sort();
        Ok(self.hasher.hash_strings(&digests))
    }

    fn hash_info_plist(&self, info_plist: Option<&InfoPlist>) -> Result<String> {
        match info_plist {
            Some(InfoPlist::Generated { contents }) => Ok(self.hasher.hash_dict(contents)),
            Some(InfoPlist::File {
                content_hash: Some(hash),
                ..
            }) => Ok(hash.clone()),
            Some(InfoPlist::File { path, .. }) => self.hasher.hash_path(path),
            None => Ok(String::new()),
        }
    }

    fn hash_dependencies(
        &self,
        graph: &Graph,
        reference: &TargetReference,
        memo: &HashMap<TargetReference, String>,
    ) -> Result<String> {
        let mut digests = Vec::new();
        for dependency in graph.direct_dependencies(&reference.as_dependency()) {
            let digest = match dependency {
                GraphDependency::Target { name, path } => {
                    let dependency_reference = TargetReference::new(path, name);
                    memo.get(&dependency_reference)
                        .cloned()
                        .ok_or_else(|| Error::MissingTarget {
                            name: name.clone(),
                            project: path.clone(),
                            referenced_by: reference.name.clone(),
                        })?
                }
                GraphDependency::Precompiled { path, .. } => self.hasher.hash_path(path)?,
                GraphDependency::PackageProduct { product, .. } => {
                    self.hasher.hash(&format!("package:{}", product))
                }
            };
            digests.push(digest);
        }
        digests.sort();
        Ok(self.hasher.hash_strings(&digests))
    }
}

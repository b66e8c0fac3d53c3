//! Substitution of cached binaries into a graph.
//!
//! A target is replaceable when a binary was fetched for it, it is not one
//! of the focused source targets, and every target it depends on is
//! replaceable too. A binary built from a target links its static
//! dependencies in, so once a target is swapped out its subtree has to be
//! swapped out with it.
//!
//! Every edge pointing at a replaceable target is redirected to the
//! precompiled node of its binary. That node keeps the dynamic artifacts
//! (frameworks, xcframeworks, bundles) the target depended on, since those
//! still have to be embedded by consumers; static libraries and package
//! products are dropped. Replaced targets are flagged `prune` and lose their
//! own edges; removing them is left to the tree-shaking graph mapper.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use log::debug;

use crate::error::Result;
use crate::graph::{Graph, GraphDependency, PrecompiledArtifact, TargetReference};

#[derive(Debug, Default, Clone, Copy)]
pub struct CacheGraphMutator;

impl CacheGraphMutator {
    pub fn new() -> Self {
        Self
    }

    /// Replaces targets with the binaries in `artifacts`. Targets named in
    /// `sources` are never replaced.
    pub fn map(
        &self,
        mut graph: Graph,
        artifacts: &HashMap<TargetReference, PathBuf>,
        sources: &HashSet<String>,
    ) -> Result<Graph> {
        let replacements = replaceable_targets(&graph, artifacts, sources)?;
        if replacements.is_empty() {
            return Ok(graph);
        }

        let replacement_node = |reference: &TargetReference| -> Option<GraphDependency> {
            replacements
                .get(reference)
                .map(|path| GraphDependency::precompiled(path.clone()))
        };

        // Dependencies carried over by each binary.
        let mut carried: Vec<(GraphDependency, BTreeSet<GraphDependency>)> = Vec::new();
        for (reference, path) in &replacements {
            let mut kept = BTreeSet::new();
            for dependency in graph.direct_dependencies(&reference.as_dependency()) {
                let candidate = match dependency {
                    GraphDependency::Target { name, path } => {
                        replacement_node(&TargetReference::new(path, name))
                    }
                    GraphDependency::Precompiled { .. } => Some(dependency.clone()),
                    GraphDependency::PackageProduct { .. } => None,
                };
                if let Some(node @ GraphDependency::Precompiled { kind, .. }) = candidate {
                    if kind.is_dynamic() {
                        kept.insert(node);
                    }
                }
            }
            carried.push((GraphDependency::precompiled(path.clone()), kept));
        }

        let mut dependencies = BTreeMap::new();
        for (from, to) in std::mem::take(&mut graph.dependencies) {
            if let Some(reference) = from.target_reference() {
                if replacements.contains_key(&reference) {
                    continue;
                }
            }
            let rewritten: BTreeSet<GraphDependency> = to
                .into_iter()
                .map(|node| {
                    node.target_reference()
                        .and_then(|reference| replacement_node(&reference))
                        .unwrap_or(node)
                })
                .collect();
            dependencies.insert(from, rewritten);
        }
        for (node, kept) in carried {
            if !kept.is_empty() {
                dependencies.entry(node).or_default().extend(kept);
            }
        }
        graph.dependencies = dependencies;

        for (reference, path) in &replacements {
            graph
                .precompiled
                .insert(path.clone(), PrecompiledArtifact::new(path.clone()));
            if let Some(project) = graph.projects.get_mut(&reference.project_path) {
                if let Some(target) = project
                    .targets
                    .iter_mut()
                    .find(|t| t.name == reference.name)
                {
                    target.prune = true;
                }
            }
            debug!("Replaced {} with {}", reference, path.display());
        }

        Ok(graph)
    }
}

/// Targets to replace, with the binary replacing each.
fn replaceable_targets(
    graph: &Graph,
    artifacts: &HashMap<TargetReference, PathBuf>,
    sources: &HashSet<String>,
) -> Result<HashMap<TargetReference, PathBuf>> {
    let mut replaceable: HashMap<TargetReference, bool> = HashMap::new();
    // Dependencies come first, so each lookup below is already decided.
    for reference in graph.topological_sort()? {
        let decision = artifacts.contains_key(&reference)
            && !sources.contains(&reference.name)
            && graph
                .direct_target_dependencies(&reference.project_path, &reference.name)
                .iter()
                .all(|dep| replaceable.get(&dep.reference()).copied().unwrap_or(false));
        replaceable.insert(reference, decision);
    }

    Ok(replaceable
        .into_iter()
        .filter(|(_, decision)| *decision)
        .filter_map(|(reference, _)| {
            let path = artifacts.get(&reference)?.clone();
            Some((reference, path))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::graph_of;
    use crate::graph::{Product, Project, Target, TargetDependency};
    use std::path::Path;

    fn target_dep(name: &str) -> TargetDependency {
        TargetDependency::Target {
            name: name.to_string(),
        }
    }

    /// App -> Feature -> Core, Feature -> libVendor.a, Core -> Dyn.framework
    fn fixture() -> Graph {
        graph_of(vec![Project::new("/ws/P", "P")
            .with_target(Target::new("App", Product::App).with_dependency(target_dep("Feature")))
            .with_target(
                Target::new("Feature", Product::Framework)
                    .with_dependency(target_dep("Core"))
                    .with_dependency(TargetDependency::Precompiled {
                        path: "/ws/Vendor/libVendor.a".into(),
                    })
                    .with_dependency(TargetDependency::Package {
                        product: "Alamofire".to_string(),
                    }),
            )
            .with_target(
                Target::new("Core", Product::Framework).with_dependency(
                    TargetDependency::Precompiled {
                        path: "/ws/Vendor/Dyn.framework".into(),
                    },
                ),
            )])
    }

    fn artifact(name: &str) -> PathBuf {
        PathBuf::from(format!("/cache/Binaries/{0}hash/{0}.framework", name))
    }

    fn reference(name: &str) -> TargetReference {
        TargetReference::new("/ws/P", name)
    }

    fn is_pruned(graph: &Graph, name: &str) -> bool {
        graph
            .target(Path::new("/ws/P"), name)
            .map(|t| t.target.prune)
            .unwrap_or(false)
    }

    #[test]
    fn test_no_artifacts_leaves_graph_unchanged() {
        let graph = fixture();
        let mapped = CacheGraphMutator::new()
            .map(graph.clone(), &HashMap::new(), &HashSet::new())
            .unwrap();
        assert_eq!(mapped, graph);
    }

    #[test]
    fn test_leaf_hit_rewrites_edges_and_prunes() {
        let artifacts = HashMap::from([(reference("Core"), artifact("Core"))]);
        let mapped = CacheGraphMutator::new()
            .map(fixture(), &artifacts, &HashSet::new())
            .unwrap();

        let core_binary = GraphDependency::precompiled(artifact("Core"));
        let feature_deps = mapped.direct_dependencies(&reference("Feature").as_dependency());
        assert!(feature_deps.contains(&&core_binary));
        assert!(!feature_deps.contains(&&reference("Core").as_dependency()));

        assert!(is_pruned(&mapped, "Core"));
        assert!(!is_pruned(&mapped, "Feature"));
        assert!(mapped
            .direct_dependencies(&reference("Core").as_dependency())
            .is_empty());

        // The dynamic framework Core linked against travels with its binary.
        assert_eq!(
            mapped.direct_dependencies(&core_binary),
            vec![&GraphDependency::precompiled("/ws/Vendor/Dyn.framework")]
        );
    }

    #[test]
    fn test_target_with_missed_dependency_is_not_replaced() {
        let artifacts = HashMap::from([(reference("Feature"), artifact("Feature"))]);
        let mapped = CacheGraphMutator::new()
            .map(fixture(), &artifacts, &HashSet::new())
            .unwrap();
        assert_eq!(mapped, fixture());
    }

    #[test]
    fn test_whole_subtree_replaced() {
        let artifacts = HashMap::from([
            (reference("Feature"), artifact("Feature")),
            (reference("Core"), artifact("Core")),
        ]);
        let mapped = CacheGraphMutator::new()
            .map(fixture(), &artifacts, &HashSet::new())
            .unwrap();

        let feature_binary = GraphDependency::precompiled(artifact("Feature"));
        assert_eq!(
            mapped.direct_dependencies(&reference("App").as_dependency()),
            vec![&feature_binary]
        );
        // Core's binary is dynamic and is kept; the static library and the
        // package are linked into Feature's binary.
        assert_eq!(
            mapped.direct_dependencies(&feature_binary),
            vec![&GraphDependency::precompiled(artifact("Core"))]
        );
        assert!(is_pruned(&mapped, "Feature"));
        assert!(is_pruned(&mapped, "Core"));
    }

    #[test]
    fn test_focused_sources_are_kept() {
        let artifacts = HashMap::from([
            (reference("Feature"), artifact("Feature")),
            (reference("Core"), artifact("Core")),
        ]);
        let sources = HashSet::from(["Core".to_string()]);
        let mapped = CacheGraphMutator::new()
            .map(fixture(), &artifacts, &sources)
            .unwrap();
        assert_eq!(mapped, fixture());
    }
}

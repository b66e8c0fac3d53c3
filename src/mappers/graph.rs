//! Graph mappers.

use std::collections::BTreeSet;
use std::path::PathBuf;

use log::debug;

use super::{GraphMapping, SideEffectDescriptor};
use crate::error::Result;
use crate::graph::{Graph, GraphDependency};

/// Removes targets flagged `prune`, every edge from or to them, and the
/// projects they leave empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeShakePrunedTargetsMapper;

impl GraphMapping for TreeShakePrunedTargetsMapper {
    fn name(&self) -> &'static str {
        "TreeShakePrunedTargetsMapper"
    }

    fn map(&self, mut graph: Graph) -> Result<(Graph, Vec<SideEffectDescriptor>)> {
        let pruned: BTreeSet<GraphDependency> = graph
            .all_targets()
            .iter()
            .filter(|t| t.target.prune)
            .map(|t| t.as_dependency())
            .collect();
        if pruned.is_empty() {
            return Ok((graph, Vec::new()));
        }
        debug!("Tree shaking {} pruned targets", pruned.len());

        graph.dependencies.retain(|from, _| !pruned.contains(from));
        for to in graph.dependencies.values_mut() {
            to.retain(|node| !pruned.contains(node));
        }
        graph.dependencies.retain(|_, to| !to.is_empty());

        let mut emptied: Vec<PathBuf> = Vec::new();
        for (path, project) in graph.projects.iter_mut() {
            let before = project.targets.len();
            project.targets.retain(|t| !t.prune);
            if before > 0 && project.targets.is_empty() {
                emptied.push(path.clone());
            }
        }
        for path in &emptied {
            debug!("Removing project {} left without targets", path.display());
            graph.projects.remove(path);
        }
        graph
            .workspace
            .projects
            .retain(|path| !emptied.contains(path));

        Ok((graph, Vec::new()))
    }
}

//! Traversals over the dependency edges.
//!
//! All traversals are depth-first and post-order: dependencies are emitted
//! before the nodes that depend on them. A visited set keyed by structural
//! identity makes shared nodes (diamonds) appear once. Cycle detection keeps
//! the current DFS path and reports it when a node on it is met again.

use std::collections::{BTreeSet, HashSet};

use super::{Graph, GraphDependency, TargetReference};
use crate::error::{Error, Result};

impl Graph {
    /// Every node reachable from `node`, excluding `node` itself, in
    /// post-order.
    pub fn transitive_dependencies(&self, node: &GraphDependency) -> Vec<GraphDependency> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(node.clone());
        for dependency in self.direct_dependencies(node) {
            self.collect_post_order(dependency, &mut order, &mut visited);
        }
        order
    }

    fn collect_post_order(
        &self,
        node: &GraphDependency,
        order: &mut Vec<GraphDependency>,
        visited: &mut HashSet<GraphDependency>,
    ) {
        if !visited.insert(node.clone()) {
            return;
        }
        for dependency in self.direct_dependencies(node) {
            self.collect_post_order(dependency, order, visited);
        }
        order.push(node.clone());
    }

    /// All targets ordered so that every target comes after the targets it
    /// depends on.
    ///
    /// Fails with [`Error::CycleDetected`] if the edges form a cycle.
    pub fn topological_sort(&self) -> Result<Vec<TargetReference>> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for target in self.all_targets() {
            self.visit(&target.as_dependency(), &mut order, &mut visited, &mut stack)?;
        }

        Ok(order
            .into_iter()
            .filter_map(|node| node.target_reference())
            .collect())
    }

    /// Fails with [`Error::CycleDetected`] if any target reaches itself.
    pub fn validate_acyclic(&self) -> Result<()> {
        self.topological_sort().map(|_| ())
    }

    fn visit(
        &self,
        node: &GraphDependency,
        order: &mut Vec<GraphDependency>,
        visited: &mut HashSet<GraphDependency>,
        stack: &mut Vec<GraphDependency>,
    ) -> Result<()> {
        if let Some(start) = stack.iter().position(|n| n == node) {
            let mut members: Vec<String> =
                stack[start..].iter().map(ToString::to_string).collect();
            members.push(node.to_string());
            return Err(Error::CycleDetected {
                cycle: members.join(" -> "),
            });
        }
        if visited.contains(node) {
            return Ok(());
        }

        stack.push(node.clone());
        for dependency in self.direct_dependencies(node) {
            self.visit(dependency, order, visited, stack)?;
        }
        stack.pop();

        visited.insert(node.clone());
        order.push(node.clone());
        Ok(())
    }

    /// Groups targets into levels: level 0 has no target dependencies, level
    /// `n` depends only on targets of lower levels.
    ///
    /// Each level can be processed in parallel once all earlier levels are
    /// done.
    pub fn target_levels(&self) -> Result<Vec<Vec<TargetReference>>> {
        let order = self.topological_sort()?;
        let mut level_of = std::collections::HashMap::new();
        let mut levels: Vec<Vec<TargetReference>> = Vec::new();

        for reference in order {
            let level = self
                .direct_target_dependencies(&reference.project_path, &reference.name)
                .iter()
                .filter_map(|dep| level_of.get(&dep.reference()))
                .map(|level: &usize| level + 1)
                .max()
                .unwrap_or(0);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(reference.clone());
            level_of.insert(reference, level);
        }

        Ok(levels)
    }

    /// References of every target reachable from `roots`, roots included.
    pub fn targets_closure<'a, I>(&self, roots: I) -> BTreeSet<TargetReference>
    where
        I: IntoIterator<Item = &'a TargetReference>,
    {
        let mut closure = BTreeSet::new();
        for root in roots {
            let node = root.as_dependency();
            closure.insert(root.clone());
            closure.extend(
                self.transitive_dependencies(&node)
                    .iter()
                    .filter_map(GraphDependency::target_reference),
            );
        }
        closure
    }
}

//! # Dependency Graph
//!
//! The graph is the resolved form of a workspace description: projects keyed
//! by path, precompiled artifacts keyed by path, package products, and a
//! directed edge map from each node to the nodes it depends on.
//!
//! ## Identity
//!
//! Nodes are identified structurally. A target is `(project path, name)`, an
//! artifact is its path, a package product is `(project path, product)`.
//! Nothing refers to nodes by pointer, so a `Graph` can be cloned, compared
//! and rebuilt by every mapping pass without invalidating references.
//!
//! ## Modules
//!
//! - [`model`]: the declarative input (projects, targets, declared
//!   dependencies).
//! - [`cache`]: the additive [`GraphCache`] populated while loading.
//! - [`loader`]: [`GraphLoader`], which validates the input and builds a
//!   [`Graph`].
//! - [`traversal`]: lookups, topological ordering and cycle detection.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod cache;
pub mod loader;
pub mod model;
pub mod traversal;

pub use cache::GraphCache;
pub use loader::GraphLoader;
pub use model::{
    ArtifactKind, InfoPlist, PackageProduct, PrecompiledArtifact, Product, Project, SigningEntry,
    SourceFile, Target, TargetDependency, Workspace, WorkspaceWithProjects,
};

/// A node of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphDependency {
    /// A target built from sources.
    Target { name: String, path: PathBuf },
    /// A binary that is linked instead of built.
    Precompiled { path: PathBuf, kind: ArtifactKind },
    /// A product of a package dependency.
    PackageProduct { path: PathBuf, product: String },
}

impl GraphDependency {
    pub fn target(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        GraphDependency::Target {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn precompiled(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = ArtifactKind::from_path(&path);
        GraphDependency::Precompiled { path, kind }
    }

    /// The target reference if this node is a target.
    pub fn target_reference(&self) -> Option<TargetReference> {
        match self {
            GraphDependency::Target { name, path } => Some(TargetReference::new(path, name)),
            _ => None,
        }
    }
}

impl fmt::Display for GraphDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphDependency::Target { name, path } => write!(f, "{} ({})", name, path.display()),
            GraphDependency::Precompiled { path, .. } => write!(f, "{}", path.display()),
            GraphDependency::PackageProduct { product, .. } => write!(f, "{} (package)", product),
        }
    }
}

/// Structural key of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetReference {
    pub project_path: PathBuf,
    pub name: String,
}

impl TargetReference {
    pub fn new(project_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            name: name.into(),
        }
    }

    pub fn as_dependency(&self) -> GraphDependency {
        GraphDependency::target(self.name.clone(), self.project_path.clone())
    }
}

impl fmt::Display for TargetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_path.display(), self.name)
    }
}

/// A target together with the project it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct GraphTarget<'a> {
    pub path: &'a Path,
    pub target: &'a Target,
    pub project: &'a Project,
}

impl GraphTarget<'_> {
    pub fn reference(&self) -> TargetReference {
        TargetReference::new(self.path, &self.target.name)
    }

    pub fn as_dependency(&self) -> GraphDependency {
        GraphDependency::target(self.target.name.clone(), self.path)
    }
}

/// The resolved dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    pub path: PathBuf,
    pub workspace: Workspace,
    pub projects: BTreeMap<PathBuf, Project>,
    pub precompiled: BTreeMap<PathBuf, PrecompiledArtifact>,
    pub packages: BTreeSet<PackageProduct>,
    #[serde(with = "edge_list")]
    pub dependencies: BTreeMap<GraphDependency, BTreeSet<GraphDependency>>,
}

/// Edges are written as a list of `{from, to}` entries since JSON object
/// keys have to be strings.
mod edge_list {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Edges<T> {
        from: GraphDependency,
        to: T,
    }

    pub fn serialize<S: Serializer>(
        edges: &BTreeMap<GraphDependency, BTreeSet<GraphDependency>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(edges.iter().map(|(from, to)| Edges {
            from: from.clone(),
            to,
        }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<BTreeMap<GraphDependency, BTreeSet<GraphDependency>>, D::Error> {
        let entries = Vec::<Edges<BTreeSet<GraphDependency>>>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| (e.from, e.to)).collect())
    }
}

impl Graph {
    /// An empty graph for `workspace`.
    pub fn new(workspace: Workspace) -> Self {
        Self {
            name: workspace.name.clone(),
            path: workspace.path.clone(),
            workspace,
            projects: BTreeMap::new(),
            precompiled: BTreeMap::new(),
            packages: BTreeSet::new(),
            dependencies: BTreeMap::new(),
        }
    }

    pub fn project(&self, path: &Path) -> Option<&Project> {
        self.projects.get(path)
    }

    pub fn target(&self, path: &Path, name: &str) -> Option<GraphTarget<'_>> {
        let (path, project) = self.projects.get_key_value(path)?;
        let target = project.target(name)?;
        Some(GraphTarget {
            path,
            target,
            project,
        })
    }

    /// Resolves a node to its target, if it is one.
    pub fn target_from(&self, dependency: &GraphDependency) -> Option<GraphTarget<'_>> {
        match dependency {
            GraphDependency::Target { name, path } => self.target(path, name),
            _ => None,
        }
    }

    pub fn precompiled(&self, path: &Path) -> Option<&PrecompiledArtifact> {
        self.precompiled.get(path)
    }

    /// Every target, ordered by project path then declaration order.
    pub fn all_targets(&self) -> Vec<GraphTarget<'_>> {
        self.projects
            .iter()
            .flat_map(|(path, project)| {
                project.targets.iter().map(move |target| GraphTarget {
                    path,
                    target,
                    project,
                })
            })
            .collect()
    }

    /// Direct dependencies of `node`, in node order.
    pub fn direct_dependencies(&self, node: &GraphDependency) -> Vec<&GraphDependency> {
        self.dependencies
            .get(node)
            .map(|deps| deps.iter().collect())
            .unwrap_or_default()
    }

    /// Direct dependencies of a target that are themselves targets.
    pub fn direct_target_dependencies(&self, path: &Path, name: &str) -> Vec<GraphTarget<'_>> {
        self.direct_dependencies(&GraphDependency::target(name, path))
            .into_iter()
            .filter_map(|dep| self.target_from(dep))
            .collect()
    }

    /// Nodes with an edge to `node`.
    pub fn dependents(&self, node: &GraphDependency) -> Vec<&GraphDependency> {
        self.dependencies
            .iter()
            .filter(|(_, deps)| deps.contains(node))
            .map(|(from, _)| from)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A framework target with a single source file.
    pub fn framework(name: &str, source: &str) -> Target {
        Target::new(name, Product::Framework).with_sources([source])
    }

    /// Builds a graph from projects, resolving declared dependencies.
    pub fn graph_of(projects: Vec<Project>) -> Graph {
        GraphLoader::new()
            .load(WorkspaceWithProjects::from_projects("/ws", projects))
            .unwrap()
    }
}

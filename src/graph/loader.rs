//! Builds a validated [`Graph`] from a workspace description.
//!
//! Loading happens in three steps:
//!
//! 1. every project is checked for duplicate target names and added to a
//!    [`GraphCache`];
//! 2. every declared dependency is resolved against the cache into a
//!    [`GraphDependency`] edge, registering precompiled artifacts and
//!    package products on the way;
//! 3. the resulting graph is checked for cycles.
//!
//! Project paths are normalized before indexing and relative dependency
//! paths are resolved against the declaring project's directory. Projects
//! are visited in path order, so the first error reported is stable.

use std::collections::{BTreeSet, HashSet};

use log::debug;

use super::cache::GraphCache;
use super::model::{
    PackageProduct, PrecompiledArtifact, Project, Target, TargetDependency, WorkspaceWithProjects,
};
use super::{Graph, GraphDependency};
use crate::error::{Error, Result};
use crate::path::{absolute, normalize};

#[derive(Debug, Default)]
pub struct GraphLoader;

impl GraphLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, input: WorkspaceWithProjects) -> Result<Graph> {
        let WorkspaceWithProjects {
            workspace,
            projects,
        } = input;

        let mut cache = GraphCache::new();
        for mut project in projects {
            check_unique_target_names(&project)?;
            project.path = normalize(&project.path);
            cache.add_project(project);
        }

        let mut graph = Graph::new(workspace);
        let mut edges = Vec::new();
        for project in cache.projects() {
            for target in &project.targets {
                let from = GraphDependency::target(target.name.clone(), project.path.clone());
                let mut resolved = BTreeSet::new();
                for declared in &target.dependencies {
                    resolved.insert(resolve(&cache, project, target, declared)?);
                }
                if !resolved.is_empty() {
                    edges.push((from, resolved));
                }
            }
        }

        for (from, to) in edges {
            for node in &to {
                match node {
                    GraphDependency::Precompiled { path, .. } => {
                        graph
                            .precompiled
                            .insert(path.clone(), PrecompiledArtifact::new(path.clone()));
                    }
                    GraphDependency::PackageProduct { path, product } => {
                        graph.packages.insert(PackageProduct {
                            path: path.clone(),
                            product: product.clone(),
                        });
                    }
                    GraphDependency::Target { .. } => {}
                }
            }
            graph.dependencies.insert(from, to);
        }

        for project in cache.projects() {
            graph.projects.insert(project.path.clone(), project.clone());
        }

        graph.validate_acyclic()?;
        debug!(
            "Loaded graph {} with {} projects and {} edges",
            graph.name,
            graph.projects.len(),
            graph.dependencies.values().map(BTreeSet::len).sum::<usize>()
        );
        Ok(graph)
    }
}

fn check_unique_target_names(project: &Project) -> Result<()> {
    let mut seen = HashSet::new();
    for target in &project.targets {
        if !seen.insert(target.name.as_str()) {
            return Err(Error::DuplicateTarget {
                name: target.name.clone(),
                project: project.path.clone(),
            });
        }
    }
    Ok(())
}

fn resolve(
    cache: &GraphCache,
    project: &Project,
    target: &Target,
    declared: &TargetDependency,
) -> Result<GraphDependency> {
    match declared {
        TargetDependency::Target { name } => {
            if cache.target(&project.path, name).is_none() {
                return Err(Error::MissingTarget {
                    name: name.clone(),
                    project: project.path.clone(),
                    referenced_by: target.name.clone(),
                });
            }
            Ok(GraphDependency::target(name.clone(), project.path.clone()))
        }
        TargetDependency::Project {
            target: name,
            path,
        } => {
            let path = absolute(&project.path, path);
            if cache.project(&path).is_none() {
                return Err(Error::MissingProject {
                    path,
                    referenced_by: target.name.clone(),
                });
            }
            if cache.target(&path, name).is_none() {
                return Err(Error::MissingTarget {
                    name: name.clone(),
                    project: path,
                    referenced_by: target.name.clone(),
                });
            }
            Ok(GraphDependency::target(name.clone(), path))
        }
        TargetDependency::Precompiled { path } => {
            Ok(GraphDependency::precompiled(absolute(&project.path, path)))
        }
        TargetDependency::Package { product } => Ok(GraphDependency::PackageProduct {
            path: project.path.clone(),
            product: product.clone(),
        }),
    }
}

//! Additive index of loaded entities.
//!
//! The loader fills a [`GraphCache`] while it walks the workspace and then
//! freezes it into a [`Graph`](super::Graph). Inserting an existing key
//! replaces the previous entry; lookups never fail, they return `None`.
//! Projects iterate in path order.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::model::{PackageProduct, PrecompiledArtifact, Project, Target};

#[derive(Debug, Clone, Default)]
pub struct GraphCache {
    projects: BTreeMap<PathBuf, Project>,
    targets: HashMap<(PathBuf, String), Target>,
    precompiled: HashMap<PathBuf, PrecompiledArtifact>,
    packages: HashMap<(PathBuf, String), PackageProduct>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a project. Its targets are indexed as well.
    pub fn add_project(&mut self, project: Project) {
        for target in &project.targets {
            self.add_target(&project.path, target.clone());
        }
        self.projects.insert(project.path.clone(), project);
    }

    pub fn add_target(&mut self, path: &Path, target: Target) {
        self.targets
            .insert((path.to_path_buf(), target.name.clone()), target);
    }

    pub fn add_precompiled(&mut self, artifact: PrecompiledArtifact) {
        self.precompiled.insert(artifact.path.clone(), artifact);
    }

    pub fn add_package(&mut self, package: PackageProduct) {
        self.packages
            .insert((package.path.clone(), package.product.clone()), package);
    }

    pub fn project(&self, path: &Path) -> Option<&Project> {
        self.projects.get(path)
    }

    pub fn target(&self, path: &Path, name: &str) -> Option<&Target> {
        self.targets.get(&(path.to_path_buf(), name.to_string()))
    }

    pub fn precompiled(&self, path: &Path) -> Option<&PrecompiledArtifact> {
        self.precompiled.get(path)
    }

    pub fn package(&self, path: &Path, product: &str) -> Option<&PackageProduct> {
        self.packages.get(&(path.to_path_buf(), product.to_string()))
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn precompiled_artifacts(&self) -> impl Iterator<Item = &PrecompiledArtifact> {
        self.precompiled.values()
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageProduct> {
        self.packages.values()
    }
}

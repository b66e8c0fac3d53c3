//! # Mapper Pipeline
//!
//! Mappers are the passes that turn the declared workspace into the one that
//! gets generated. Each pass is a pure value transform: it takes a
//! [`Project`], a [`WorkspaceWithProjects`] or a [`Graph`] and returns the
//! transformed value together with the side effects (files and directories
//! to create or remove) that generating it requires. Mappers never touch the
//! filesystem themselves; [`SideEffectExecutor`](crate::side_effects::SideEffectExecutor)
//! applies the collected descriptors at the end.
//!
//! ## Composition
//!
//! The `Sequential*Mapper` types run a list of mappers in order, feeding each
//! one the previous output. Side effects are concatenated in the same order;
//! an exact duplicate of an earlier descriptor is dropped.
//!
//! ## Modules
//!
//! - [`project`]: per-project passes (paths, derived directory, resources,
//!   Info.plist, signing).
//! - [`workspace`]: workspace passes.
//! - [`graph`]: graph passes.
//! - [`factory`]: the default pipelines.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::graph::{Graph, Project, WorkspaceWithProjects};

pub mod factory;
pub mod graph;
pub mod plist;
pub mod project;
pub mod workspace;

pub use factory::MapperFactory;
pub use graph::TreeShakePrunedTargetsMapper;
pub use project::{
    AbsolutePathMapper, DerivedDirectoryMapper, InfoPlistMapper, ResourcesMapper, SigningMapper,
};
pub use workspace::{ProjectWorkspaceMapper, TemplateMacrosMapper};

/// Whether a side effect creates or removes its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorState {
    Present,
    Absent,
}

/// A filesystem change required by a mapping result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SideEffectDescriptor {
    File {
        path: PathBuf,
        #[serde(skip)]
        contents: Option<Vec<u8>>,
        state: DescriptorState,
    },
    Directory {
        path: PathBuf,
        state: DescriptorState,
    },
}

impl SideEffectDescriptor {
    /// A file to write with `contents`.
    pub fn file(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        SideEffectDescriptor::File {
            path: path.into(),
            contents: Some(contents.into()),
            state: DescriptorState::Present,
        }
    }

    /// A directory to create.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        SideEffectDescriptor::Directory {
            path: path.into(),
            state: DescriptorState::Present,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SideEffectDescriptor::File { path, .. } | SideEffectDescriptor::Directory { path, .. } => {
                path
            }
        }
    }

    pub fn state(&self) -> DescriptorState {
        match self {
            SideEffectDescriptor::File { state, .. }
            | SideEffectDescriptor::Directory { state, .. } => *state,
        }
    }
}

impl fmt::Display for SideEffectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.state() {
            DescriptorState::Present => "create",
            DescriptorState::Absent => "remove",
        };
        let kind = match self {
            SideEffectDescriptor::File { .. } => "file",
            SideEffectDescriptor::Directory { .. } => "directory",
        };
        write!(f, "{} {} {}", action, kind, self.path().display())
    }
}

/// Drops exact duplicates, keeping the first occurrence in place.
pub fn dedup_side_effects(side_effects: Vec<SideEffectDescriptor>) -> Vec<SideEffectDescriptor> {
    let mut seen = HashSet::new();
    side_effects
        .into_iter()
        .filter(|effect| seen.insert(effect.clone()))
        .collect()
}

pub trait ProjectMapping: Send + Sync {
    fn name(&self) -> &'static str;
    fn map(&self, project: Project) -> Result<(Project, Vec<SideEffectDescriptor>)>;
}

pub trait WorkspaceMapping: Send + Sync {
    fn name(&self) -> &'static str;
    fn map(
        &self,
        workspace: WorkspaceWithProjects,
    ) -> Result<(WorkspaceWithProjects, Vec<SideEffectDescriptor>)>;
}

pub trait GraphMapping: Send + Sync {
    fn name(&self) -> &'static str;
    fn map(&self, graph: Graph) -> Result<(Graph, Vec<SideEffectDescriptor>)>;
}

/// Runs project mappers in order.
#[derive(Clone, Default)]
pub struct SequentialProjectMapper {
    mappers: Vec<Arc<dyn ProjectMapping>>,
}

impl SequentialProjectMapper {
    pub fn new(mappers: Vec<Arc<dyn ProjectMapping>>) -> Self {
        Self { mappers }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.mappers.iter().map(|m| m.name()).collect()
    }
}

impl ProjectMapping for SequentialProjectMapper {
    fn name(&self) -> &'static str {
        "SequentialProjectMapper"
    }

    fn map(&self, project: Project) -> Result<(Project, Vec<SideEffectDescriptor>)> {
        let mut side_effects = Vec::new();
        let mut project = project;
        for mapper in &self.mappers {
            let (mapped, effects) = mapper.map(project)?;
            project = mapped;
            side_effects.extend(effects);
        }
        Ok((project, dedup_side_effects(side_effects)))
    }
}

/// Runs workspace mappers in order.
#[derive(Clone, Default)]
pub struct SequentialWorkspaceMapper {
    mappers: Vec<Arc<dyn WorkspaceMapping>>,
}

impl SequentialWorkspaceMapper {
    pub fn new(mappers: Vec<Arc<dyn WorkspaceMapping>>) -> Self {
        Self { mappers }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.mappers.iter().map(|m| m.name()).collect()
    }
}

impl WorkspaceMapping for SequentialWorkspaceMapper {
    fn name(&self) -> &'static str {
        "SequentialWorkspaceMapper"
    }

    fn map(
        &self,
        workspace: WorkspaceWithProjects,
    ) -> Result<(WorkspaceWithProjects, Vec<SideEffectDescriptor>)> {
        let mut side_effects = Vec::new();
        let mut workspace = workspace;
        for mapper in &self.mappers {
            let (mapped, effects) = mapper.map(workspace)?;
            workspace = mapped;
            side_effects.extend(effects);
        }
        Ok((workspace, dedup_side_effects(side_effects)))
    }
}

/// Runs graph mappers in order.
#[derive(Clone, Default)]
pub struct SequentialGraphMapper {
    mappers: Vec<Arc<dyn GraphMapping>>,
}

impl SequentialGraphMapper {
    pub fn new(mappers: Vec<Arc<dyn GraphMapping>>) -> Self {
        Self { mappers }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.mappers.iter().map(|m| m.name()).collect()
    }
}

impl GraphMapping for SequentialGraphMapper {
    fn name(&self) -> &'static str {
        "SequentialGraphMapper"
    }

    fn map(&self, graph: Graph) -> Result<(Graph, Vec<SideEffectDescriptor>)> {
        let mut side_effects = Vec::new();
        let mut graph = graph;
        for mapper in &self.mappers {
            let (mapped, effects) = mapper.map(graph)?;
            graph = mapped;
            side_effects.extend(effects);
        }
        Ok((graph, dedup_side_effects(side_effects)))
    }
}

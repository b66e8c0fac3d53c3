//! Assembles the default mapper pipelines.

use std::sync::Arc;

use super::{
    AbsolutePathMapper, DerivedDirectoryMapper, GraphMapping, InfoPlistMapper, ProjectMapping,
    ProjectWorkspaceMapper, ResourcesMapper, SequentialGraphMapper, SequentialProjectMapper,
    SequentialWorkspaceMapper, SigningMapper, TemplateMacrosMapper, TreeShakePrunedTargetsMapper,
    WorkspaceMapping,
};
use crate::defaults::DERIVED_DIRECTORY_NAME;
use crate::hashing::{ContentHasher, ContentHashing};

/// Builds the project, workspace and graph pipelines used by generation.
#[derive(Clone)]
pub struct MapperFactory {
    derived_directory_name: String,
    hasher: Arc<dyn ContentHashing>,
}

impl MapperFactory {
    pub fn new(derived_directory_name: impl Into<String>, hasher: Arc<dyn ContentHashing>) -> Self {
        Self {
            derived_directory_name: derived_directory_name.into(),
            hasher,
        }
    }

    /// Project mappers in the order they must run. Resources and Info.plist
    /// synthesis write into the derived directory, so they come after it.
    pub fn project_mappers(&self) -> Vec<Arc<dyn ProjectMapping>> {
        vec![
            Arc::new(AbsolutePathMapper),
            Arc::new(DerivedDirectoryMapper::new(
                self.derived_directory_name.clone(),
            )),
            Arc::new(ResourcesMapper::new(Arc::clone(&self.hasher))),
            Arc::new(InfoPlistMapper::new(Arc::clone(&self.hasher))),
            Arc::new(SigningMapper),
        ]
    }

    pub fn default_project_mapper(&self) -> SequentialProjectMapper {
        SequentialProjectMapper::new(self.project_mappers())
    }

    pub fn workspace_mappers(&self) -> Vec<Arc<dyn WorkspaceMapping>> {
        vec![
            Arc::new(ProjectWorkspaceMapper::new(Arc::new(
                self.default_project_mapper(),
            ))),
            Arc::new(TemplateMacrosMapper),
        ]
    }

    pub fn default_workspace_mapper(&self) -> SequentialWorkspaceMapper {
        SequentialWorkspaceMapper::new(self.workspace_mappers())
    }

    pub fn graph_mappers(&self) -> Vec<Arc<dyn GraphMapping>> {
        vec![Arc::new(TreeShakePrunedTargetsMapper)]
    }

    pub fn default_graph_mapper(&self) -> SequentialGraphMapper {
        SequentialGraphMapper::new(self.graph_mappers())
    }
}

impl Default for MapperFactory {
    fn default() -> Self {
        Self::new(DERIVED_DIRECTORY_NAME, Arc::new(ContentHasher::default()))
    }
}

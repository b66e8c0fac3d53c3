//! # Generation
//!
//! [`Generator`] runs the full transformation of a workspace description:
//!
//! 1. the workspace mapper pipeline (per-project passes, template macros);
//! 2. graph loading and validation;
//! 3. binary cache substitution, when a [`CacheGraphMapper`] is configured;
//! 4. the graph mapper pipeline (tree shaking of replaced targets).
//!
//! Nothing is written to disk. The caller decides whether to apply the
//! returned side effects with
//! [`SideEffectExecutor`](crate::side_effects::SideEffectExecutor).

use log::{debug, info};

use crate::binary_cache::CacheGraphMapper;
use crate::error::Result;
use crate::graph::{Graph, GraphLoader, TargetReference, WorkspaceWithProjects};
use crate::mappers::{
    dedup_side_effects, GraphMapping, MapperFactory, SequentialGraphMapper,
    SequentialWorkspaceMapper, SideEffectDescriptor, WorkspaceMapping,
};

/// The outcome of a generation.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The graph handed to the project writer.
    pub graph: Graph,
    /// Files and directories generation requires, in application order.
    pub side_effects: Vec<SideEffectDescriptor>,
    /// Targets replaced by cached binaries.
    pub substituted: Vec<TargetReference>,
}

pub struct Generator {
    workspace_mapper: SequentialWorkspaceMapper,
    graph_mapper: SequentialGraphMapper,
    cache_mapper: Option<CacheGraphMapper>,
}

impl Generator {
    pub fn new(
        workspace_mapper: SequentialWorkspaceMapper,
        graph_mapper: SequentialGraphMapper,
    ) -> Self {
        Self {
            workspace_mapper,
            graph_mapper,
            cache_mapper: None,
        }
    }

    /// A generator with the factory's default pipelines and no binary cache.
    pub fn from_factory(factory: &MapperFactory) -> Self {
        Self::new(
            factory.default_workspace_mapper(),
            factory.default_graph_mapper(),
        )
    }

    pub fn with_cache_mapper(mut self, cache_mapper: CacheGraphMapper) -> Self {
        self.cache_mapper = Some(cache_mapper);
        self
    }

    pub async fn generate(&self, workspace: WorkspaceWithProjects) -> Result<Generation> {
        debug!(
            "Generating workspace {} with {} projects",
            workspace.workspace.name,
            workspace.projects.len()
        );
        let (workspace, mut side_effects) = self.workspace_mapper.map(workspace)?;
        let graph = GraphLoader::new().load(workspace)?;

        let graph = match &self.cache_mapper {
            Some(cache_mapper) => cache_mapper.map(graph).await?,
            None => graph,
        };
        let substituted: Vec<TargetReference> = graph
            .all_targets()
            .into_iter()
            .filter(|t| t.target.prune)
            .map(|t| t.reference())
            .collect();

        let (graph, graph_side_effects) = self.graph_mapper.map(graph)?;
        side_effects.extend(graph_side_effects);

        info!(
            "Generated {} targets, {} replaced by binaries",
            graph.all_targets().len(),
            substituted.len()
        );
        Ok(Generation {
            graph,
            side_effects: dedup_side_effects(side_effects),
            substituted,
        })
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::from_factory(&MapperFactory::default())
    }
}

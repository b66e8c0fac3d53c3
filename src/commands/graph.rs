//! # Graph Command Implementation
//!
//! Displays the dependency graph of a workspace as a tree: one root per
//! target nothing else depends on, children being direct dependencies.
//! Shared dependencies appear under every dependent.
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use ptree::{print_tree, TreeItem};

use graphsmith::graph::{Graph, GraphDependency, GraphLoader};
use graphsmith::hashing::ContentHasher;
use graphsmith::mappers::{MapperFactory, WorkspaceMapping};

use super::Session;

/// Display the target dependency tree
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Path to the workspace manifest (YAML or JSON).
    #[arg(short, long, value_name = "FILE", default_value = "workspace.yaml")]
    pub manifest: PathBuf,

    /// Maximum depth to display in the tree.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,

    /// Print the whole graph as JSON instead of a tree
    #[arg(long)]
    pub json: bool,
}

/// Execute the `graph` command.
pub fn execute(args: GraphArgs) -> Result<()> {
    let session = Session::open(&args.manifest)?;
    let factory = MapperFactory::new(
        session.config.generation.derived_directory.clone(),
        Arc::new(ContentHasher::default()),
    );
    let (workspace, _) = factory
        .default_workspace_mapper()
        .map(session.workspace)
        .context("Failed to map workspace")?;
    let graph = GraphLoader::new()
        .load(workspace)
        .context("Failed to load dependency graph")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    let root = build_tree(&graph, args.depth.unwrap_or(usize::MAX));
    print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

fn build_tree(graph: &Graph, max_depth: usize) -> TreeNode {
    let children = graph
        .all_targets()
        .into_iter()
        .map(|t| t.as_dependency())
        .filter(|node| graph.dependents(node).is_empty())
        .map(|node| build_tree_node(graph, &node, max_depth, 0))
        .collect();
    TreeNode {
        label: graph.name.clone(),
        children,
    }
}

fn build_tree_node(
    graph: &Graph,
    node: &GraphDependency,
    max_depth: usize,
    current_depth: usize,
) -> TreeNode {
    let label = match node {
        GraphDependency::Target { name, path } => match graph.target(path, name) {
            Some(target) => format!("{} [{}]", name, target.target.product),
            None => name.clone(),
        },
        other => other.to_string(),
    };
    let children = if current_depth >= max_depth {
        Vec::new()
    } else {
        graph
            .direct_dependencies(node)
            .into_iter()
            .map(|child| build_tree_node(graph, child, max_depth, current_depth + 1))
            .collect()
    };
    TreeNode { label, children }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsmith::graph::{Product, Project, Target, TargetDependency, WorkspaceWithProjects};

    fn graph() -> Graph {
        let app = Target::new("App", Product::App)
            .with_dependency(TargetDependency::Target {
                name: "Core".to_string(),
            })
            .with_dependency(TargetDependency::Package {
                product: "Logging".to_string(),
            });
        let core = Target::new("Core", Product::Framework);
        let workspace = WorkspaceWithProjects::from_projects(
            "/ws",
            vec![Project::new("/ws/App", "App")
                .with_target(app)
                .with_target(core)],
        );
        GraphLoader::new().load(workspace).unwrap()
    }

    #[test]
    fn test_roots_are_targets_without_dependents() {
        let tree = build_tree(&graph(), usize::MAX);
        assert_eq!(tree.label, "ws");
        assert_eq!(tree.children.len(), 1);

        let app = &tree.children[0];
        assert_eq!(app.label, "App [app]");
        let labels: Vec<&str> = app.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Core [framework]", "Logging (package)"]);
    }

    #[test]
    fn test_depth_limits_children() {
        let tree = build_tree(&graph(), 0);
        assert!(tree.children[0].children.is_empty());
    }

    #[test]
    fn test_execute_missing_manifest() {
        let result = execute(GraphArgs {
            manifest: PathBuf::from("/nonexistent/workspace.yaml"),
            depth: None,
            json: false,
        });
        assert!(result.unwrap_err().to_string().contains("Failed to load manifest"));
    }
}

//! # graphsmith
//!
//! This library is the core of a project generator for native application
//! workspaces. It resolves a declarative workspace description into a
//! dependency graph, hashes every target by content, swaps targets whose
//! binaries are already cached for those binaries, and runs the mapping
//! passes that produce the final graph and the files generation requires.
//! It is used by the `graphsmith` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use graphsmith::filesystem::MemoryFS;
//! use graphsmith::graph::{
//!     GraphLoader, Product, Project, Target, TargetDependency, WorkspaceWithProjects,
//! };
//! use graphsmith::hashing::{is_cacheable, ContentHasher, GraphContentHasher};
//!
//! // Sources live in an in-memory filesystem.
//! let mut fs = MemoryFS::new();
//! fs.add_file_string("/ws/Core/Sources/Core.swift", "public struct Core {}");
//!
//! let core = Target::new("Core", Product::Framework)
//!     .with_sources(["/ws/Core/Sources/Core.swift"]);
//! let app = Target::new("App", Product::App).with_dependency(TargetDependency::Target {
//!     name: "Core".to_string(),
//! });
//! let workspace = WorkspaceWithProjects::from_projects(
//!     "/ws",
//!     vec![Project::new("/ws/Core", "Core").with_target(core).with_target(app)],
//! );
//!
//! // Resolve the graph and hash the targets that can be cached.
//! let graph = GraphLoader::new().load(workspace).unwrap();
//! let hasher = GraphContentHasher::new(Arc::new(ContentHasher::new(Arc::new(fs))));
//! let hashes = hasher.content_hashes(&graph, is_cacheable, &[]).unwrap();
//! assert_eq!(hashes.len(), 1);
//! ```
//!
//! ## Core Concepts
//!
//! - **Graph (`graph`)**: projects, targets, precompiled artifacts and
//!   package products with structural identity, loaded and validated by
//!   `GraphLoader`.
//! - **Hashing (`hashing`)**: MD5 content hashes of files and directories,
//!   and per-target hashes that fold in every dependency.
//! - **Storage (`storage`)**: local, remote and combined binary caches
//!   behind one object-safe async trait.
//! - **Binary cache (`binary_cache`)**: substitutes cached binaries into the
//!   graph.
//! - **Mappers (`mappers`)**: pure passes over projects, workspaces and
//!   graphs that describe their filesystem needs as side effects.
//!
//! ## Execution Flow
//!
//! `generator::Generator` runs the workspace mappers, loads the graph,
//! substitutes cached binaries and runs the graph mappers. The resulting
//! side effects are applied by `side_effects::SideEffectExecutor`.

pub mod binary_cache;
pub mod config;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod generator;
pub mod graph;
pub mod hashing;
pub mod manifest;
pub mod mappers;
pub mod output;
pub mod path;
pub mod root_directory;
pub mod side_effects;
pub mod storage;

//! # Hash Command Implementation
//!
//! Prints the content hash of every cacheable target of a workspace: the
//! key its binary is stored under. The workspace mappers run first so the
//! hashes match the ones `generate` looks up.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use graphsmith::graph::GraphLoader;
use graphsmith::hashing::{is_cacheable, ContentHasher, GraphContentHasher};
use graphsmith::mappers::{MapperFactory, WorkspaceMapping};

use super::Session;

/// Print the cache hashes of cacheable targets
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Path to the workspace manifest (YAML or JSON).
    #[arg(short, long, value_name = "FILE", default_value = "workspace.yaml")]
    pub manifest: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct HashEntry {
    name: String,
    project: PathBuf,
    hash: String,
}

/// Execute the `hash` command.
pub fn execute(args: HashArgs) -> Result<()> {
    let session = Session::open(&args.manifest)?;
    let hasher = Arc::new(ContentHasher::default());
    let factory = MapperFactory::new(
        session.config.generation.derived_directory.clone(),
        hasher.clone(),
    );

    let (workspace, _) = factory
        .default_workspace_mapper()
        .map(session.workspace)
        .context("Failed to map workspace")?;
    let graph = GraphLoader::new()
        .load(workspace)
        .context("Failed to load dependency graph")?;
    let hashes = GraphContentHasher::new(hasher)
        .content_hashes(
            &graph,
            is_cacheable,
            &session.config.hashing.additional_strings,
        )
        .context("Failed to hash targets")?;

    let entries: Vec<HashEntry> = hashes
        .into_iter()
        .map(|(reference, hash)| HashEntry {
            name: reference.name,
            project: reference.project_path,
            hash,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No cacheable targets found.");
        return Ok(());
    }
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for entry in &entries {
        println!("{:<width$}  {}", entry.name, entry.hash, width = width);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_execute_missing_manifest() {
        let args = HashArgs {
            manifest: PathBuf::from("/nonexistent/workspace.yaml"),
            json: false,
        };

        let result = execute(args);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to load manifest"));
    }

    #[test]
    fn test_execute_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("workspace.yaml");
        std::fs::write(
            &manifest,
            r#"
workspace: {path: ., name: Shop}
projects:
  - path: Core
    name: Core
    targets:
      - name: Core
        product: framework
        sources: [{path: Sources/Missing.swift}]
"#,
        )
        .unwrap();

        let result = execute(HashArgs {
            manifest,
            json: true,
        });
        assert!(result.is_err());
    }
}

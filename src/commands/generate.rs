//! # Generate Command Implementation
//!
//! Runs the generator over a workspace manifest: mapper pipelines, graph
//! loading, binary cache substitution and tree shaking. Reports which
//! targets were replaced by cached binaries and which files and directories
//! generation requires, then applies those side effects unless `--dry-run`
//! is given.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use graphsmith::binary_cache::CacheGraphMapper;
use graphsmith::generator::{Generation, Generator};
use graphsmith::hashing::{ContentHasher, GraphContentHasher};
use graphsmith::mappers::MapperFactory;
use graphsmith::output::OutputConfig;
use graphsmith::side_effects::SideEffectExecutor;

use super::{block_on, disabled_storage, Session};

/// Generate the workspace, replacing cached targets with binaries
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the workspace manifest (YAML or JSON).
    #[arg(short, long, value_name = "FILE", default_value = "workspace.yaml")]
    pub manifest: PathBuf,

    /// The root directory for the local binary cache.
    ///
    /// If not provided, it defaults to `cache.directory` from
    /// `.graphsmith.yaml`, then to the system's cache directory
    /// (e.g., `~/.cache/graphsmith` on Linux).
    #[arg(long, value_name = "DIR", env = "GRAPHSMITH_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Show what would be written without touching the disk
    #[arg(long)]
    pub dry_run: bool,

    /// Build every target from source
    #[arg(long)]
    pub no_binary_cache: bool,

    /// Targets to keep as sources even when a cached binary exists
    #[arg(long = "source", value_name = "TARGET")]
    pub sources: Vec<String>,
}

/// Execute the `generate` command.
pub fn execute(args: GenerateArgs, output: &OutputConfig) -> Result<()> {
    let session = Session::open(&args.manifest)?;
    let hasher = Arc::new(ContentHasher::default());
    let factory = MapperFactory::new(
        session.config.generation.derived_directory.clone(),
        hasher.clone(),
    );

    let storage = if args.no_binary_cache {
        disabled_storage()
    } else {
        session.storage(&session.cache_root(args.cache_root.clone()))?
    };
    let cache_mapper = CacheGraphMapper::new(GraphContentHasher::new(hasher), storage)
        .with_sources(args.sources.iter().cloned())
        .with_additional_strings(session.config.hashing.additional_strings.clone());
    let generator = Generator::from_factory(&factory).with_cache_mapper(cache_mapper);

    let generation = block_on(async {
        generator
            .generate(session.workspace)
            .await
            .context("Failed to generate workspace")
    })?;

    report(&generation, output);

    if args.dry_run {
        println!(
            "\n{} Dry run mode - no changes were made.",
            output.marker("🔎", "[DRY RUN]")
        );
        return Ok(());
    }
    SideEffectExecutor::new()
        .execute(&generation.side_effects)
        .context("Failed to apply side effects")?;
    println!(
        "\n{} Generated {} targets.",
        output.marker("✅", "[OK]"),
        generation.graph.all_targets().len()
    );
    Ok(())
}

fn report(generation: &Generation, output: &OutputConfig) {
    if generation.substituted.is_empty() {
        println!("No targets replaced by cached binaries.");
    } else {
        println!("{}", output.heading("Replaced by cached binaries:"));
        for reference in &generation.substituted {
            println!("  {}", reference);
        }
    }

    if !generation.side_effects.is_empty() {
        println!("\n{}", output.heading("Side effects:"));
        for side_effect in &generation.side_effects {
            println!("  {}", side_effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(manifest: PathBuf, dry_run: bool) -> GenerateArgs {
        GenerateArgs {
            manifest,
            cache_root: None,
            dry_run,
            no_binary_cache: true,
            sources: Vec::new(),
        }
    }

    fn write_manifest(temp_dir: &TempDir) -> PathBuf {
        let manifest = temp_dir.path().join("workspace.yaml");
        std::fs::write(
            &manifest,
            r#"
workspace: {path: ., name: Shop}
projects:
  - path: App
    name: App
    targets:
      - name: App
        product: app
"#,
        )
        .unwrap();
        manifest
    }

    #[test]
    fn test_execute_missing_manifest() {
        let result = execute(
            args(PathBuf::from("/nonexistent/workspace.yaml"), true),
            &OutputConfig::without_color(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = write_manifest(&temp_dir);

        execute(args(manifest, true), &OutputConfig::without_color()).unwrap();
        assert!(!temp_dir.path().join("App/Derived").exists());
    }

    #[test]
    fn test_applies_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = write_manifest(&temp_dir);

        execute(args(manifest, false), &OutputConfig::without_color()).unwrap();
        assert!(temp_dir.path().join("App/Derived").is_dir());
    }
}

//! # Cache Command Implementation
//!
//! This module implements the `cache` subcommand, which manages the local
//! binary cache.
//!
//! ## Subcommands
//!
//! - **`list`**: Display every cached entry with its artifacts and size
//! - **`clean`**: Remove every cached entry
//! - **`store`**: Store built artifacts under a target name and hash

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};

use graphsmith::config;
use graphsmith::defaults::default_cache_root;
use graphsmith::output::OutputConfig;
use graphsmith::root_directory::RootDirectoryLocator;
use graphsmith::storage::{
    CacheCategory, CacheLocalStorage, CacheStorableItem, CacheStoring, LocalCacheEntry,
};

use super::block_on;

/// Manage the local binary cache
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// The root directory for the local binary cache.
    ///
    /// If not provided, it defaults to `cache.directory` from the
    /// workspace's `.graphsmith.yaml`, then to the system's cache directory
    /// (e.g., `~/.cache/graphsmith` on Linux).
    /// Can also be set with the `GRAPHSMITH_CACHE` environment variable.
    #[arg(long, value_name = "DIR", env = "GRAPHSMITH_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List all cached entries
    List(ListArgs),
    /// Remove all cached entries
    Clean(CleanArgs),
    /// Store artifacts for a target
    Store(StoreArgs),
}

/// Arguments for the cache list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the cache clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Show what would be deleted without actually deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the cache store command
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Target name; artifacts are looked up by this name
    pub name: String,

    /// Content hash of the target, as printed by `graphsmith hash`
    pub hash: String,

    /// Artifacts to store (frameworks, xcframeworks, libraries, bundles)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Cache category to store into
    #[arg(long, value_enum, default_value = "binaries")]
    pub category: CategoryArg,

    /// Build duration in milliseconds, recorded as metadata
    #[arg(long, value_name = "MILLIS")]
    pub build_duration: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CategoryArg {
    Binaries,
    SelectiveTests,
}

impl From<CategoryArg> for CacheCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Binaries => CacheCategory::Binaries,
            CategoryArg::SelectiveTests => CacheCategory::SelectiveTests,
        }
    }
}

/// Execute the `cache` command.
pub fn execute(args: CacheArgs, output: &OutputConfig) -> Result<()> {
    let cache_root = match args.cache_root {
        Some(cache_root) => cache_root,
        None => configured_cache_root()?,
    };
    let storage = CacheLocalStorage::new(cache_root);
    match args.command {
        CacheSubcommand::List(list_args) => execute_list(&storage, list_args, output),
        CacheSubcommand::Clean(clean_args) => execute_clean(&storage, clean_args, output),
        CacheSubcommand::Store(store_args) => execute_store(&storage, store_args, output),
    }
}

/// `cache.directory` from the configuration of the current workspace, or
/// the platform default outside of one.
fn configured_cache_root() -> Result<PathBuf> {
    let current = std::env::current_dir().context("Failed to read current directory")?;
    match RootDirectoryLocator::default().locate(&current)? {
        Some(root) => Ok(config::load(&root)?.cache_root()),
        None => Ok(default_cache_root()),
    }
}

/// Execute the `cache list` command.
fn execute_list(storage: &CacheLocalStorage, args: ListArgs, output: &OutputConfig) -> Result<()> {
    let entries = storage
        .entries()
        .with_context(|| format!("Failed to read cache at {}", storage.root().display()))?;

    if args.json {
        display_json(&entries)?;
    } else if entries.is_empty() {
        println!(
            "No cached binaries found in: {}",
            storage.root().display()
        );
    } else {
        display_table(&entries, output);
    }
    Ok(())
}

/// Execute the `cache clean` command.
fn execute_clean(
    storage: &CacheLocalStorage,
    args: CleanArgs,
    output: &OutputConfig,
) -> Result<()> {
    let entries = storage
        .entries()
        .with_context(|| format!("Failed to read cache at {}", storage.root().display()))?;
    if entries.is_empty() {
        println!("No cached binaries to clean.");
        return Ok(());
    }

    let total_size: u64 = entries.iter().map(|e| e.size).sum();
    println!("Cache entries to be deleted:\n");
    for entry in &entries {
        println!(
            "  {} {} ({})",
            entry.category,
            output.detail(&entry.hash),
            format_size(entry.size)
        );
    }
    println!(
        "\nTotal: {} entries ({})",
        entries.len(),
        format_size(total_size)
    );

    if args.dry_run {
        println!(
            "\n{} Dry run mode - no changes were made.",
            output.marker("🔎", "[DRY RUN]")
        );
        return Ok(());
    }

    let removed = storage.clean().context("Failed to clean cache")?;
    println!(
        "\n{} Successfully deleted {} cache entries.",
        output.marker("✅", "[OK]"),
        removed.len()
    );
    Ok(())
}

/// Execute the `cache store` command.
fn execute_store(
    storage: &CacheLocalStorage,
    args: StoreArgs,
    output: &OutputConfig,
) -> Result<()> {
    for path in &args.paths {
        if !path.exists() {
            bail!("Artifact not found: {}", path.display());
        }
    }
    let mut item = CacheStorableItem::new(args.name, args.hash);
    if let Some(millis) = args.build_duration {
        item = item.with_build_duration(millis);
    }
    let category = CacheCategory::from(args.category);
    let items = HashMap::from([(item.clone(), args.paths)]);

    let stored = block_on(async {
        storage
            .store(&items, category)
            .await
            .context("Failed to store artifacts")
    })?;
    if stored.is_empty() {
        bail!("Failed to store {} in {}", item, storage.root().display());
    }
    println!(
        "{} Stored {} in {}",
        output.marker("✅", "[OK]"),
        item,
        storage.entry_directory(category, &item.hash).display()
    );
    Ok(())
}

/// Display cache entries in table format
fn display_table(entries: &[LocalCacheEntry], output: &OutputConfig) {
    println!("{}\n", output.heading("Cached binaries:"));
    println!(
        "{:<16} {:<34} {:<30} {:>12}",
        "CATEGORY", "HASH", "ARTIFACTS", "SIZE"
    );
    println!("{}", "-".repeat(95));

    for entry in entries {
        let artifacts: String = artifact_names(entry).join(", ").chars().take(30).collect();
        println!(
            "{:<16} {:<34} {:<30} {:>12}",
            entry.category.as_str(),
            entry.hash,
            artifacts,
            format_size(entry.size)
        );
    }

    let total_size: u64 = entries.iter().map(|e| e.size).sum();
    println!(
        "\nTotal: {} cached entries ({})",
        entries.len(),
        format_size(total_size)
    );
}

/// Display cache entries in JSON format
fn display_json(entries: &[LocalCacheEntry]) -> Result<()> {
    let json_entries: Vec<serde_json::Value> = entries
        .iter()
        .map(|e| {
            let last_modified = e
                .last_modified
                .and_then(|mtime| mtime.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs());
            serde_json::json!({
                "category": e.category,
                "hash": e.hash,
                "artifacts": artifact_names(e),
                "size": e.size,
                "last_modified": last_modified,
                "path": e.dir_path,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_entries)?);
    Ok(())
}

fn artifact_names(entry: &LocalCacheEntry) -> Vec<String> {
    entry
        .artifacts
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

/// Format size in human-readable format
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `graphsmith` command-line tool. Each subcommand is defined in its own file
//! with an `Args` struct derived using `clap` and an `execute` function.
//!
//! The helpers below are shared by the commands that read a workspace
//! manifest: locating the root directory, loading `.graphsmith.yaml`,
//! assembling the cache storage and driving async work to completion.

pub mod cache;
pub mod generate;
pub mod graph;
pub mod hash;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::debug;

use graphsmith::config::{self, Config};
use graphsmith::graph::WorkspaceWithProjects;
use graphsmith::manifest;
use graphsmith::root_directory::RootDirectoryLocator;
use graphsmith::storage::{
    CacheLocalStorage, CacheRemoteStorage, CacheStorage, CacheStoring, EmptyCacheStorage,
};

/// A loaded manifest together with the configuration of its root.
pub struct Session {
    pub config: Config,
    pub workspace: WorkspaceWithProjects,
}

impl Session {
    /// Loads `manifest` and the configuration found at its root directory.
    ///
    /// Without any root marker the manifest's own directory is the root.
    pub fn open(manifest_path: &Path) -> Result<Self> {
        let workspace = manifest::load(manifest_path).with_context(|| {
            format!("Failed to load manifest from {}", manifest_path.display())
        })?;
        let manifest_directory = workspace.workspace.path.clone();
        let root = RootDirectoryLocator::default()
            .locate(&manifest_directory)?
            .unwrap_or(manifest_directory);
        debug!("Root directory: {}", root.display());
        let config = config::load(&root)
            .with_context(|| format!("Failed to load configuration from {}", root.display()))?;
        Ok(Self {
            config,
            workspace,
        })
    }

    /// The local cache root: `--cache-root`/`GRAPHSMITH_CACHE`, then the
    /// configuration file, then the platform default.
    pub fn cache_root(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.unwrap_or_else(|| self.config.cache_root())
    }

    /// The storage used to fetch binaries: local, backed by the remote cache
    /// when one is configured.
    pub fn storage(&self, cache_root: &Path) -> Result<Arc<dyn CacheStoring>> {
        let local = CacheLocalStorage::new(cache_root);
        let remote = match self.config.remote_settings()? {
            Some(settings) => {
                debug!("Remote cache: {}", settings.url);
                let remote = CacheRemoteStorage::new(settings, local.clone())?;
                Some(Box::new(remote) as Box<dyn CacheStoring>)
            }
            None => None,
        };
        Ok(Arc::new(CacheStorage::new(Box::new(local), remote)))
    }
}

/// Storage that never hits, for `--no-binary-cache`.
pub fn disabled_storage() -> Arc<dyn CacheStoring> {
    Arc::new(EmptyCacheStorage)
}

/// Runs `future` on a fresh runtime, aborting it on Ctrl-C.
pub fn block_on<T, F>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(async {
        tokio::select! {
            result = future => result,
            _ = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted")),
        }
    })
}

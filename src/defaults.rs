//! Default values for graphsmith configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Name of the directory synthesized files are written to, per project.
pub const DERIVED_DIRECTORY_NAME: &str = "Derived";

/// Configuration file looked up at the workspace root.
pub const CONFIG_FILE_NAME: &str = ".graphsmith.yaml";

/// Directory marking a workspace root.
pub const DATA_DIRECTORY_NAME: &str = ".graphsmith";

/// Environment variable overriding the cache root.
pub const CACHE_ENV_VAR: &str = "GRAPHSMITH_CACHE";

/// Maximum number of concurrent remote cache requests.
pub const REMOTE_CONCURRENCY: usize = 8;

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/graphsmith` (XDG Base Directory)
/// - macOS: `~/Library/Caches/graphsmith`
/// - Windows: `{FOLDERID_LocalAppData}\graphsmith`
///
/// Falls back to `.graphsmith-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag, the
/// `GRAPHSMITH_CACHE` environment variable or `cache.directory` in the
/// configuration file.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".graphsmith-cache"))
        .join("graphsmith")
}

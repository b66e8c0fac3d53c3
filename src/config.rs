//! # Configuration
//!
//! This module defines the `.graphsmith.yaml` file read from the workspace
//! root and the logic for parsing it. Every section and field is optional;
//! a missing file yields the defaults.
//!
//! ```yaml
//! cache:
//!   directory: /path/to/cache
//!   concurrency: 8
//!   remote:
//!     url: https://cache.example.com
//!     project: org/project
//!     token_env: GRAPHSMITH_TOKEN
//! generation:
//!   derived_directory: Derived
//! hashing:
//!   additional_strings: []
//! ```
//!
//! Unknown keys are rejected so that typos surface as errors instead of
//! silently falling back to a default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults::{self, CONFIG_FILE_NAME, DERIVED_DIRECTORY_NAME, REMOTE_CONCURRENCY};
use crate::error::{Error, Result};
use crate::path::absolute;
use crate::storage::RemoteCacheSettings;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cache: CacheConfig,
    pub generation: GenerationConfig,
    pub hashing: HashingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Local cache root. Defaults to the platform cache directory.
    pub directory: Option<PathBuf>,
    /// Maximum number of concurrent remote requests.
    pub concurrency: usize,
    pub remote: Option<RemoteConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            concurrency: REMOTE_CONCURRENCY,
            remote: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    pub url: String,
    pub project: String,
    /// Environment variable holding the bearer token.
    #[serde(default)]
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub derived_directory: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            derived_directory: DERIVED_DIRECTORY_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HashingConfig {
    /// Strings mixed into every target hash, e.g. a toolchain version.
    pub additional_strings: Vec<String>,
}

/// Parses configuration from a YAML string. Empty input means defaults.
pub fn parse(yaml_content: &str) -> Result<Config> {
    if yaml_content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(yaml_content).map_err(|e| {
        let message = e.to_string();
        let hint = message.contains("unknown field").then(|| {
            "valid sections are `cache`, `generation` and `hashing`; check the key spelling"
                .to_string()
        });
        Error::ConfigParse { message, hint }
    })
}

/// Reads `.graphsmith.yaml` from `root`, or returns defaults if there is none.
/// A relative `cache.directory` is resolved against `root`.
pub fn load(root: &Path) -> Result<Config> {
    let path = root.join(CONFIG_FILE_NAME);
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let mut config = parse(&content)?;
            if let Some(directory) = config.cache.directory.as_mut() {
                *directory = absolute(root, directory);
            }
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(Error::Filesystem {
            message: format!("Failed to read '{}': {}", path.display(), e),
        }),
    }
}

impl Config {
    /// The local cache root: the configured directory, else the platform
    /// default.
    pub fn cache_root(&self) -> PathBuf {
        self.cache
            .directory
            .clone()
            .unwrap_or_else(defaults::default_cache_root)
    }

    /// Remote cache connection settings, if a remote is configured.
    ///
    /// The token is read from the environment variable named by `token_env`;
    /// an unset variable means unauthenticated requests.
    pub fn remote_settings(&self) -> Result<Option<RemoteCacheSettings>> {
        let Some(remote) = &self.cache.remote else {
            return Ok(None);
        };
        let url = Url::parse(&remote.url).map_err(|e| Error::ConfigParse {
            message: format!("invalid remote cache url '{}': {}", remote.url, e),
            hint: None,
        })?;
        let token = remote
            .token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.is_empty());
        Ok(Some(RemoteCacheSettings {
            url,
            project: remote.project.clone(),
            token,
            concurrency: self.cache.concurrency.max(1),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_config() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.concurrency, 8);
        assert_eq!(config.generation.derived_directory, "Derived");
        assert!(config.hashing.additional_strings.is_empty());
        assert!(config.remote_settings().unwrap().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
cache:
  directory: /tmp/graphsmith-cache
  concurrency: 4
  remote:
    url: https://cache.example.com
    project: org/app
generation:
  derived_directory: Generated
hashing:
  additional_strings: ["swift-5.10"]
"#;
        let config = parse(yaml).unwrap();
        assert_eq!(config.cache_root(), PathBuf::from("/tmp/graphsmith-cache"));
        assert_eq!(config.generation.derived_directory, "Generated");
        assert_eq!(config.hashing.additional_strings, vec!["swift-5.10"]);

        let remote = config.remote_settings().unwrap().unwrap();
        assert_eq!(remote.url.as_str(), "https://cache.example.com/");
        assert_eq!(remote.project, "org/app");
        assert_eq!(remote.concurrency, 4);
        assert!(remote.token.is_none());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config = parse("cache:\n  concurrency: 2\n").unwrap();
        assert_eq!(config.cache.concurrency, 2);
        assert!(config.cache.directory.is_none());
        assert_eq!(config.generation.derived_directory, "Derived");
    }

    #[test]
    fn test_unknown_field_has_hint() {
        let err = parse("cahce:\n  concurrency: 2\n").unwrap_err();
        match err {
            Error::ConfigParse { message, hint } => {
                assert!(message.contains("unknown field"));
                assert!(hint.is_some());
            }
            other => panic!("Expected ConfigParse, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_remote_url() {
        let config = parse("cache:\n  remote:\n    url: not a url\n    project: p\n").unwrap();
        assert!(matches!(
            config.remote_settings(),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(load(temp_dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_load_reads_root_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "generation:\n  derived_directory: Out\n",
        )
        .unwrap();
        let config = load(temp_dir.path()).unwrap();
        assert_eq!(config.generation.derived_directory, "Out");
    }

    #[test]
    fn test_load_resolves_cache_directory_against_root() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "cache:\n  directory: ./build/cache\n",
        )
        .unwrap();
        let config = load(temp_dir.path()).unwrap();
        assert_eq!(config.cache_root(), temp_dir.path().join("build/cache"));
    }
}

//! # Error Handling
//!
//! This module defines the centralized error type for `graphsmith`. It uses
//! the `thiserror` library to build a single `Error` enum covering every
//! anticipated failure mode, each variant carrying enough context (paths,
//! target names, mapper names) to produce one clear message.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Variants fall into a few families:
//!   - structural errors raised while loading a graph (cycles, duplicate or
//!     missing targets and projects);
//!   - hashing errors (a file referenced by a target does not exist);
//!   - mapper errors, naming the mapper and the project/target involved;
//!   - cache storage errors (I/O, network, archives), which callers at the
//!     cache boundary downgrade to cache misses;
//!   - configuration and wrapped third-party errors.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Structural and hashing errors are fatal and are propagated with `?`.
//! Storage errors are recoverable: see `binary_cache` and `storage`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for graphsmith operations
#[derive(Error, Debug)]
pub enum Error {
    /// A circular dependency was detected between targets.
    ///
    /// `cycle` lists the members in traversal order, closing on the first one.
    #[error("Cycle detected in target dependencies: {cycle}")]
    CycleDetected { cycle: String },

    /// Two targets with the same name were declared in one project.
    #[error("Duplicate target '{name}' in project at {}", project.display())]
    DuplicateTarget { name: String, project: PathBuf },

    /// A dependency references a target that does not exist.
    #[error("Target '{name}' referenced by '{referenced_by}' not found in project at {}", project.display())]
    MissingTarget {
        name: String,
        project: PathBuf,
        referenced_by: String,
    },

    /// A dependency references a project that was not loaded.
    #[error("Project at {} referenced by '{referenced_by}' was not loaded", path.display())]
    MissingProject { path: PathBuf, referenced_by: String },

    /// A path that had to be hashed does not exist.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A mapper could not transform its input.
    #[error("Mapper {mapper} failed for {subject}: {message}")]
    Mapper {
        mapper: String,
        subject: String,
        message: String,
    },

    /// A cache storage backend failed.
    #[error("Cache storage error: {message}")]
    Storage { message: String },

    /// A network request to the remote cache failed.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// An artifact archive could not be created or extracted.
    #[error("Archive error for {}: {message}", path.display())]
    Archive { path: PathBuf, message: String },

    /// The configuration or manifest file could not be parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An error occurred with a filesystem operation.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

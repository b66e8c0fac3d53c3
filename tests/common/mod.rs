//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a temporary workspace fixture, manifest snippets and
//! helpers to run the `graphsmith` binary against them.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_shop();
//!     fixture.command().arg("hash").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Workspace manifests used across tests. Paths are relative to the
/// manifest's directory.
#[allow(dead_code)]
pub mod manifests {
    /// An app depending on a framework in a sibling project and on a
    /// package product.
    pub const SHOP: &str = r#"
workspace:
  path: .
  name: Shop
  projects: [App, Core]
projects:
  - path: App
    name: App
    targets:
      - name: App
        product: app
        bundle_id: com.example.shop
        sources:
          - path: Sources/App.swift
        dependencies:
          - type: project
            target: Core
            path: ../Core
          - type: package
            product: Logging
  - path: Core
    name: Core
    targets:
      - name: Core
        product: framework
        sources:
          - path: Sources/Core.swift
"#;

    /// Two targets depending on each other.
    pub const CYCLE: &str = r#"
workspace: {path: ., name: Loop}
projects:
  - path: Loop
    name: Loop
    targets:
      - name: A
        product: framework
        dependencies: [{type: target, name: B}]
      - name: B
        product: framework
        dependencies: [{type: target, name: A}]
"#;

    /// A dependency on a target no project declares.
    pub const MISSING_TARGET: &str = r#"
workspace: {path: ., name: Broken}
projects:
  - path: App
    name: App
    targets:
      - name: App
        product: app
        dependencies: [{type: target, name: Ghost}]
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "workspace: [";

    /// Configuration keeping the cache inside the fixture.
    pub const LOCAL_CACHE_CONFIG: &str = "cache:\n  directory: cache\n";
}

/// A temporary workspace directory.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_manifest(manifests::SHOP)
///     .with_file("Core/Sources/Core.swift", "public struct Core {}");
///
/// fixture.command().arg("graph").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.graphsmith.yaml` configuration file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file(".graphsmith.yaml", content)
    }

    /// Add `workspace.yaml` with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.with_file("workspace.yaml", content)
    }

    /// The shop workspace with its sources and a fixture-local cache.
    pub fn with_shop(self) -> Self {
        self.with_config(manifests::LOCAL_CACHE_CONFIG)
            .with_manifest(manifests::SHOP)
            .with_file("App/Sources/App.swift", "import Core\n")
            .with_file("Core/Sources/Core.swift", "public struct Core {}\n")
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path().join("workspace.yaml")
    }

    /// The cache directory configured by `LOCAL_CACHE_CONFIG`.
    pub fn cache_root(&self) -> PathBuf {
        self.path().join("cache")
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command running in this fixture's directory with plain
    /// output and no inherited cache location.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("graphsmith");
        cmd.current_dir(self.path())
            .env_remove("GRAPHSMITH_CACHE")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    /// The hash `graphsmith hash --json` reports for `target`.
    pub fn target_hash(&self, target: &str) -> String {
        let output = self
            .command()
            .args(["hash", "--json"])
            .output()
            .expect("Failed to run hash");
        assert!(output.status.success(), "hash failed: {:?}", output);
        let entries: Vec<serde_json::Value> =
            serde_json::from_slice(&output.stdout).expect("hash --json should print JSON");
        entries
            .iter()
            .find(|entry| entry["name"] == target)
            .and_then(|entry| entry["hash"].as_str())
            .map(str::to_string)
            .unwrap_or_else(|| panic!("no hash for {}", target))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_shop() {
        let fixture = TestFixture::new().with_shop();
        assert!(fixture.manifest_path().exists());
        assert!(fixture.path().join(".graphsmith.yaml").exists());
        assert!(fixture.path().join("Core/Sources/Core.swift").exists());
    }

    #[test]
    fn test_manifests_are_valid_yaml() {
        for manifest in [
            manifests::SHOP,
            manifests::CYCLE,
            manifests::MISSING_TARGET,
            manifests::LOCAL_CACHE_CONFIG,
        ] {
            serde_yaml::from_str::<serde_yaml::Value>(manifest)
                .expect("Manifest should be valid YAML");
        }
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        let result = serde_yaml::from_str::<serde_yaml::Value>(manifests::INVALID_YAML);
        assert!(result.is_err(), "INVALID_YAML should not parse");
    }
}

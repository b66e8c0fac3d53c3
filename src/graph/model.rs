//! Declarative description of a workspace: projects, targets and their
//! declared dependencies.
//!
//! These types are the already-parsed input handed over by the manifest
//! loader. They are plain values (serializable, comparable) so that mappers
//! can transform them wholesale and tests can assert on them directly.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of product a target builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    App,
    AppExtension,
    CommandLineTool,
    Framework,
    StaticFramework,
    StaticLibrary,
    DynamicLibrary,
    Bundle,
    UnitTests,
    UiTests,
}

impl Product {
    /// Identifier used in hashes and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::App => "app",
            Product::AppExtension => "app_extension",
            Product::CommandLineTool => "command_line_tool",
            Product::Framework => "framework",
            Product::StaticFramework => "static_framework",
            Product::StaticLibrary => "static_library",
            Product::DynamicLibrary => "dynamic_library",
            Product::Bundle => "bundle",
            Product::UnitTests => "unit_tests",
            Product::UiTests => "ui_tests",
        }
    }

    /// Whether targets of this product can be replaced by a cached binary.
    pub fn is_cacheable(&self) -> bool {
        matches!(
            self,
            Product::Framework
                | Product::StaticFramework
                | Product::StaticLibrary
                | Product::DynamicLibrary
        )
    }

    /// Whether the product can carry its own resources.
    pub fn supports_resources(&self) -> bool {
        matches!(
            self,
            Product::App
                | Product::AppExtension
                | Product::Framework
                | Product::Bundle
                | Product::UnitTests
                | Product::UiTests
        )
    }

    /// Whether the product has to be code signed to run on a device.
    pub fn requires_signing(&self) -> bool {
        matches!(self, Product::App | Product::AppExtension | Product::UiTests)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source file of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Precomputed digest for files that only exist as side effects so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_hash: None,
        }
    }

    pub fn with_hash(path: impl Into<PathBuf>, content_hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_hash: Some(content_hash.into()),
        }
    }
}

/// Info.plist declaration of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InfoPlist {
    /// A plist file. `content_hash` is set when the file is synthesized and
    /// does not exist on disk yet.
    File {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_hash: Option<String>,
    },
    /// Contents to be synthesized into the derived directory.
    Generated { contents: BTreeMap<String, String> },
}

/// A dependency as declared by a target, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetDependency {
    /// A target in the same project.
    Target { name: String },
    /// A target in another project.
    Project { target: String, path: PathBuf },
    /// A precompiled framework, xcframework, library or bundle.
    Precompiled { path: PathBuf },
    /// A product of a package the project depends on.
    Package { product: String },
}

/// A buildable unit declared in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub product: Product,
    #[serde(default)]
    pub bundle_id: String,
    #[serde(default)]
    pub sources: Vec<SourceFile>,
    #[serde(default)]
    pub resources: Vec<PathBuf>,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub info_plist: Option<InfoPlist>,
    #[serde(default)]
    pub dependencies: Vec<TargetDependency>,
    /// Set by the cache mutator when the target was replaced by a binary.
    #[serde(default)]
    pub prune: bool,
}

impl Target {
    pub fn new(name: impl Into<String>, product: Product) -> Self {
        Self {
            name: name.into(),
            product,
            bundle_id: String::new(),
            sources: Vec::new(),
            resources: Vec::new(),
            settings: BTreeMap::new(),
            info_plist: None,
            dependencies: Vec::new(),
            prune: false,
        }
    }

    pub fn with_sources<I, P>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.sources
            .extend(sources.into_iter().map(SourceFile::new));
        self
    }

    pub fn with_resources<I, P>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn with_dependency(mut self, dependency: TargetDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }
}

/// Signing material for one target, resolved by the signing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningEntry {
    pub certificate: String,
    pub team_id: String,
    pub provisioning_profile: String,
}

/// A project: a directory holding targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub path: PathBuf,
    pub name: String,
    #[serde(default)]
    pub targets: Vec<Target>,
    /// Where synthesized files go. Assigned by `DerivedDirectoryMapper`.
    #[serde(default)]
    pub derived_directory: Option<PathBuf>,
    /// Signing entries keyed by target name; `None` disables signing.
    #[serde(default)]
    pub signing: Option<BTreeMap<String, SigningEntry>>,
}

impl Project {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            targets: Vec::new(),
            derived_directory: None,
            signing: None,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// A workspace groups projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub path: PathBuf,
    pub name: String,
    #[serde(default)]
    pub projects: Vec<PathBuf>,
    /// File header template written into the workspace's shared data.
    #[serde(default)]
    pub file_header_template: Option<String>,
}

impl Workspace {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            projects: Vec::new(),
            file_header_template: None,
        }
    }
}

/// A workspace together with the projects it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceWithProjects {
    pub workspace: Workspace,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl WorkspaceWithProjects {
    /// Builds a workspace named after its directory listing every project.
    pub fn from_projects(path: impl Into<PathBuf>, projects: Vec<Project>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Workspace".to_string());
        let mut workspace = Workspace::new(path, name);
        workspace.projects = projects.iter().map(|p| p.path.clone()).collect();
        Self {
            workspace,
            projects,
        }
    }
}

/// Kind of a precompiled artifact, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Framework,
    XcFramework,
    Library,
    Bundle,
}

impl ArtifactKind {
    /// Classifies `path` by extension; unknown extensions are treated as
    /// libraries.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("framework") => ArtifactKind::Framework,
            Some("xcframework") => ArtifactKind::XcFramework,
            Some("bundle") => ArtifactKind::Bundle,
            _ => ArtifactKind::Library,
        }
    }

    /// Whether the artifact is linked or embedded at runtime by consumers.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, ArtifactKind::Library)
    }

    /// Extensions recognised as artifacts in cache directories.
    pub const EXTENSIONS: [&'static str; 4] = ["framework", "xcframework", "a", "bundle"];
}

/// A binary product that is linked rather than built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrecompiledArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl PrecompiledArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = ArtifactKind::from_path(&path);
        Self { path, kind }
    }
}

/// A product exported by a package dependency of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageProduct {
    pub path: PathBuf,
    pub product: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cacheable_products() {
        assert!(Product::Framework.is_cacheable());
        assert!(Product::StaticLibrary.is_cacheable());
        assert!(!Product::App.is_cacheable());
        assert!(!Product::UnitTests.is_cacheable());
        assert!(!Product::Bundle.is_cacheable());
    }

    #[test]
    fn test_artifact_kind_from_path() {
        assert_eq!(
            ArtifactKind::from_path(Path::new("/c/Core.framework")),
            ArtifactKind::Framework
        );
        assert_eq!(
            ArtifactKind::from_path(Path::new("/c/Core.xcframework")),
            ArtifactKind::XcFramework
        );
        assert_eq!(
            ArtifactKind::from_path(Path::new("/c/libCore.a")),
            ArtifactKind::Library
        );
        assert_eq!(
            ArtifactKind::from_path(Path::new("/c/Core.bundle")),
            ArtifactKind::Bundle
        );
    }

    #[test]
    fn test_target_deserializes_with_defaults() {
        let yaml = r#"
name: Core
product: framework
sources:
  - path: Sources/Core.swift
dependencies:
  - type: target
    name: Utils
  - type: package
    product: Alamofire
"#;
        let target: Target = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(target.name, "Core");
        assert_eq!(target.product, Product::Framework);
        assert_eq!(target.sources.len(), 1);
        assert!(target.resources.is_empty());
        assert!(!target.prune);
        assert_eq!(
            target.dependencies,
            vec![
                TargetDependency::Target {
                    name: "Utils".to_string()
                },
                TargetDependency::Package {
                    product: "Alamofire".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_workspace_from_projects() {
        let projects = vec![Project::new("/ws/App", "App"), Project::new("/ws/Core", "Core")];
        let ws = WorkspaceWithProjects::from_projects("/ws", projects);
        assert_eq!(ws.workspace.name, "ws");
        assert_eq!(
            ws.workspace.projects,
            vec![PathBuf::from("/ws/App"), PathBuf::from("/ws/Core")]
        );
    }
}

//! Reading a workspace description dumped by the manifest loader.
//!
//! The dump is a serialized [`WorkspaceWithProjects`] in YAML (`.yaml`,
//! `.yml`) or JSON (anything else). Relative workspace and project paths are
//! resolved against the directory holding the dump; paths inside projects
//! are left to `AbsolutePathMapper`.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::graph::WorkspaceWithProjects;
use crate::path::absolute;

/// Reads and parses the dump at `path`.
pub fn load(path: &Path) -> Result<WorkspaceWithProjects> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Filesystem {
            message: format!("Failed to read manifest '{}': {}", path.display(), e),
        },
    })?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let base = std::path::absolute(&base)?;
    debug!("Loading manifest {}", path.display());
    parse(&content, is_yaml(path), &base)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Parses a dump, resolving relative paths against `base`. Every workspace
/// and project path comes back absolute and normalized.
pub fn parse(content: &str, yaml: bool, base: &Path) -> Result<WorkspaceWithProjects> {
    let mut workspace: WorkspaceWithProjects = if yaml {
        serde_yaml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };

    let resolve = |path: &mut PathBuf| *path = absolute(base, path);
    resolve(&mut workspace.workspace.path);
    for path in &mut workspace.workspace.projects {
        resolve(path);
    }
    for project in &mut workspace.projects {
        resolve(&mut project.path);
    }
    Ok(workspace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Product;
    use tempfile::TempDir;

    const YAML: &str = r#"
workspace:
  path: .
  name: Shop
  projects: [App]
projects:
  - path: App
    name: App
    targets:
      - name: App
        product: app
        sources:
          - path: Sources/App.swift
"#;

    #[test]
    fn test_parse_yaml_resolves_relative_paths() {
        let workspace = parse(YAML, true, Path::new("/ws")).unwrap();
        assert_eq!(workspace.workspace.name, "Shop");
        assert_eq!(workspace.workspace.path.to_str(), Some("/ws"));
        assert_eq!(workspace.workspace.projects, vec![PathBuf::from("/ws/App")]);
        assert_eq!(workspace.projects[0].path, PathBuf::from("/ws/App"));
        assert_eq!(workspace.projects[0].targets[0].product, Product::App);
        assert_eq!(
            workspace.projects[0].targets[0].sources[0].path,
            PathBuf::from("Sources/App.swift")
        );
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "workspace": {"path": "/abs", "name": "Shop"},
            "projects": [{"path": "/abs/Core", "name": "Core"}]
        }"#;
        let workspace = parse(json, false, Path::new("/ignored")).unwrap();
        assert_eq!(workspace.workspace.path, PathBuf::from("/abs"));
        assert_eq!(workspace.projects[0].path, PathBuf::from("/abs/Core"));
    }

    #[test]
    fn test_parse_normalizes_absolute_paths() {
        let json = r#"{
            "workspace": {"path": "/ws/./", "name": "Shop", "projects": ["/ws/App/../Core"]},
            "projects": [{"path": "/ws/App/../Core", "name": "Core"}]
        }"#;
        let workspace = parse(json, false, Path::new("/ignored")).unwrap();
        assert_eq!(workspace.workspace.path, PathBuf::from("/ws"));
        assert_eq!(workspace.workspace.projects, vec![PathBuf::from("/ws/Core")]);
        assert_eq!(workspace.projects[0].path, PathBuf::from("/ws/Core"));
    }

    #[test]
    fn test_unknown_target_keys_are_ignored() {
        let yaml = r#"
workspace: {path: ., name: Shop}
projects:
  - path: Core
    name: Core
    targets:
      - name: Core
        product: framework
        tags: [foundation]
"#;
        let with_tags = parse(yaml, true, Path::new("/ws")).unwrap();
        let untagged = yaml.replace("        tags: [foundation]\n", "");
        let without = parse(&untagged, true, Path::new("/ws")).unwrap();
        assert_eq!(with_tags.projects[0].targets, without.projects[0].targets);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load(&temp_dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("workspace.yaml");
        std::fs::write(&path, YAML).unwrap();

        let workspace = load(&path).unwrap();
        assert_eq!(workspace.projects[0].path, temp_dir.path().join("App"));
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(matches!(
            parse("workspace: [", true, Path::new("/ws")),
            Err(Error::Yaml(_))
        ));
    }
}

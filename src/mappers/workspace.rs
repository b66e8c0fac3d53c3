//! Workspace mappers.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use super::{
    dedup_side_effects, plist, ProjectMapping, SideEffectDescriptor, WorkspaceMapping,
};
use crate::error::Result;
use crate::graph::WorkspaceWithProjects;

/// Applies a project mapper to every project of the workspace.
#[derive(Clone)]
pub struct ProjectWorkspaceMapper {
    mapper: Arc<dyn ProjectMapping>,
}

impl ProjectWorkspaceMapper {
    pub fn new(mapper: Arc<dyn ProjectMapping>) -> Self {
        Self { mapper }
    }
}

impl WorkspaceMapping for ProjectWorkspaceMapper {
    fn name(&self) -> &'static str {
        "ProjectWorkspaceMapper"
    }

    fn map(
        &self,
        workspace: WorkspaceWithProjects,
    ) -> Result<(WorkspaceWithProjects, Vec<SideEffectDescriptor>)> {
        let WorkspaceWithProjects {
            workspace,
            projects,
        } = workspace;

        let mut side_effects = Vec::new();
        let mut mapped = Vec::with_capacity(projects.len());
        for project in projects {
            let (project, effects) = self.mapper.map(project)?;
            side_effects.extend(effects);
            mapped.push(project);
        }

        Ok((
            WorkspaceWithProjects {
                workspace,
                projects: mapped,
            },
            dedup_side_effects(side_effects),
        ))
    }
}

/// Writes the workspace's file header template where the IDE picks it up.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateMacrosMapper;

impl TemplateMacrosMapper {
    const FILE_HEADER_KEY: &'static str = "FILEHEADER";
}

impl WorkspaceMapping for TemplateMacrosMapper {
    fn name(&self) -> &'static str {
        "TemplateMacrosMapper"
    }

    fn map(
        &self,
        workspace: WorkspaceWithProjects,
    ) -> Result<(WorkspaceWithProjects, Vec<SideEffectDescriptor>)> {
        let Some(template) = workspace.workspace.file_header_template.as_ref() else {
            return Ok((workspace, Vec::new()));
        };

        let path = workspace
            .workspace
            .path
            .join(format!("{}.xcworkspace", workspace.workspace.name))
            .join("xcshareddata")
            .join("IDETemplateMacros.plist");
        debug!(
            "Transforming workspace {}: template macros at {}",
            workspace.workspace.name,
            path.display()
        );

        // The IDE inserts the header right after "//", so lead with a space.
        let header = if template.starts_with(' ') || template.is_empty() {
            template.clone()
        } else {
            format!(" {}", template)
        };
        let contents = plist::render(&BTreeMap::from([(
            Self::FILE_HEADER_KEY.to_string(),
            header,
        )]));

        Ok((workspace, vec![SideEffectDescriptor::file(path, contents)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Product, Project, Target};
    use crate::mappers::project::DerivedDirectoryMapper;
    use std::path::PathBuf;

    fn workspace() -> WorkspaceWithProjects {
        WorkspaceWithProjects::from_projects(
            "/ws",
            vec![
                Project::new("/ws/App", "App").with_target(Target::new("App", Product::App)),
                Project::new("/ws/Core", "Core")
                    .with_target(Target::new("Core", Product::Framework)),
            ],
        )
    }

    #[test]
    fn test_project_workspace_mapper_maps_every_project() {
        let mapper = ProjectWorkspaceMapper::new(Arc::new(DerivedDirectoryMapper::default()));
        let (mapped, side_effects) = mapper.map(workspace()).unwrap();

        assert!(mapped
            .projects
            .iter()
            .all(|p| p.derived_directory.is_some()));
        assert_eq!(
            side_effects,
            vec![
                SideEffectDescriptor::directory("/ws/App/Derived"),
                SideEffectDescriptor::directory("/ws/Core/Derived"),
            ]
        );
    }

    #[test]
    fn test_template_macros_without_template_is_noop() {
        let (mapped, side_effects) = TemplateMacrosMapper.map(workspace()).unwrap();
        assert_eq!(mapped, workspace());
        assert!(side_effects.is_empty());
    }

    #[test]
    fn test_template_macros_writes_plist() {
        let mut input = workspace();
        input.workspace.file_header_template = Some("Copyright Example".to_string());

        let (_, side_effects) = TemplateMacrosMapper.map(input).unwrap();
        match &side_effects[..] {
            [SideEffectDescriptor::File {
                path,
                contents: Some(contents),
                ..
            }] => {
                assert_eq!(
                    path,
                    &PathBuf::from("/ws/ws.xcworkspace/xcshareddata/IDETemplateMacros.plist")
                );
                let text = String::from_utf8_lossy(contents);
                assert!(text.contains("<key>FILEHEADER</key>"));
                assert!(text.contains("<string> Copyright Example</string>"));
            }
            other => panic!("Unexpected side effects: {:?}", other),
        }
    }
}

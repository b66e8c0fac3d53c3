//! Per-project mappers.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use log::debug;

use super::{plist, ProjectMapping, SideEffectDescriptor};
use crate::error::{Error, Result};
use crate::graph::{InfoPlist, Product, Project, SourceFile, Target, TargetDependency};
use crate::hashing::ContentHashing;
use crate::path::absolute;

fn mapper_error(mapper: &str, subject: impl Into<String>, message: impl Into<String>) -> Error {
    Error::Mapper {
        mapper: mapper.to_string(),
        subject: subject.into(),
        message: message.into(),
    }
}

fn derived_directory<'a>(mapper: &str, project: &'a Project) -> Result<&'a Path> {
    project.derived_directory.as_deref().ok_or_else(|| {
        mapper_error(
            mapper,
            project.name.clone(),
            "derived directory is not set; DerivedDirectoryMapper must run first",
        )
    })
}

/// Resolves relative paths in a project against the project directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbsolutePathMapper;

impl ProjectMapping for AbsolutePathMapper {
    fn name(&self) -> &'static str {
        "AbsolutePathMapper"
    }

    fn map(&self, mut project: Project) -> Result<(Project, Vec<SideEffectDescriptor>)> {
        debug!("Transforming project {}: resolving relative paths", project.name);
        let base = project.path.clone();

        if let Some(derived) = project.derived_directory.as_mut() {
            *derived = absolute(&base, derived);
        }
        for target in &mut project.targets {
            for source in &mut target.sources {
                source.path = absolute(&base, &source.path);
            }
            for resource in &mut target.resources {
                *resource = absolute(&base, resource);
            }
            if let Some(InfoPlist::File { path, .. }) = target.info_plist.as_mut() {
                *path = absolute(&base, path);
            }
            for dependency in &mut target.dependencies {
                match dependency {
                    TargetDependency::Precompiled { path } | TargetDependency::Project { path, .. } => {
                        *path = absolute(&base, path);
                    }
                    TargetDependency::Target { .. } | TargetDependency::Package { .. } => {}
                }
            }
        }

        Ok((project, Vec::new()))
    }
}

/// Assigns the directory synthesized files are written to.
#[derive(Debug, Clone)]
pub struct DerivedDirectoryMapper {
    directory_name: String,
}

impl DerivedDirectoryMapper {
    pub fn new(directory_name: impl Into<String>) -> Self {
        Self {
            directory_name: directory_name.into(),
        }
    }
}

impl Default for DerivedDirectoryMapper {
    fn default() -> Self {
        Self::new(crate::defaults::DERIVED_DIRECTORY_NAME)
    }
}

impl ProjectMapping for DerivedDirectoryMapper {
    fn name(&self) -> &'static str {
        "DerivedDirectoryMapper"
    }

    fn map(&self, mut project: Project) -> Result<(Project, Vec<SideEffectDescriptor>)> {
        let derived = project
            .derived_directory
            .get_or_insert_with(|| project.path.join(&self.directory_name))
            .clone();
        debug!(
            "Transforming project {}: derived directory {}",
            project.name,
            derived.display()
        );
        Ok((project, vec![SideEffectDescriptor::directory(derived)]))
    }
}

/// Moves resources of targets that cannot host them into a companion
/// bundle target and synthesizes a source file to locate that bundle.
#[derive(Clone)]
pub struct ResourcesMapper {
    hasher: Arc<dyn ContentHashing>,
}

impl ResourcesMapper {
    pub fn new(hasher: Arc<dyn ContentHashing>) -> Self {
        Self { hasher }
    }

    fn accessor_source(bundle_name: &str) -> String {
        format!(
            r#"// Generated by graphsmith. Do not edit.
import Foundation

private class BundleFinder {{}}

public extension Bundle {{
    static let module: Bundle = {{
        let bundleName = "{bundle}"
        let candidates = [Bundle.main.resourceURL, Bundle(for: BundleFinder.self).resourceURL]
        for candidate in candidates {{
            let bundlePath = candidate?.appendingPathComponent(bundleName + ".bundle")
            if let bundle = bundlePath.flatMap(Bundle.init(url:)) {{
                return bundle
            }}
        }}
        fatalError("unable to find bundle named {bundle}")
    }}()
}}
"#,
            bundle = bundle_name
        )
    }
}

impl ProjectMapping for ResourcesMapper {
    fn name(&self) -> &'static str {
        "ResourcesMapper"
    }

    fn map(&self, mut project: Project) -> Result<(Project, Vec<SideEffectDescriptor>)> {
        let needs_bundle = |t: &Target| !t.resources.is_empty() && !t.product.supports_resources();
        if !project.targets.iter().any(needs_bundle) {
            return Ok((project, Vec::new()));
        }

        let sources_directory = derived_directory(self.name(), &project)?.join("Sources");
        let mut side_effects = Vec::new();
        let mut bundles = Vec::new();

        for index in 0..project.targets.len() {
            if !needs_bundle(&project.targets[index]) {
                continue;
            }
            let bundle_name = format!("{}_{}", project.name, project.targets[index].name);
            if project.target(&bundle_name).is_some() {
                return Err(mapper_error(
                    self.name(),
                    format!("{}/{}", project.name, project.targets[index].name),
                    format!("a target named '{}' already exists", bundle_name),
                ));
            }
            debug!(
                "Transforming project {}: moving resources of {} into {}",
                project.name, project.targets[index].name, bundle_name
            );

            let target = &mut project.targets[index];
            let mut bundle = Target::new(bundle_name.clone(), Product::Bundle);
            bundle.resources = std::mem::take(&mut target.resources);
            if !target.bundle_id.is_empty() {
                bundle.bundle_id = format!("{}.resources", target.bundle_id);
            }

            let contents = Self::accessor_source(&bundle_name);
            let accessor_path = sources_directory.join(format!("{}+Bundle.swift", bundle_name));
            let content_hash = self.hasher.hash(&contents);
            target
                .sources
                .push(SourceFile::with_hash(accessor_path.clone(), content_hash));
            target.dependencies.push(TargetDependency::Target {
                name: bundle_name,
            });

            side_effects.push(SideEffectDescriptor::file(accessor_path, contents));
            bundles.push(bundle);
        }

        project.targets.extend(bundles);
        Ok((project, side_effects))
    }
}

/// Writes generated Info.plist contents to files in the derived directory.
#[derive(Clone)]
pub struct InfoPlistMapper {
    hasher: Arc<dyn ContentHashing>,
}

impl InfoPlistMapper {
    pub fn new(hasher: Arc<dyn ContentHashing>) -> Self {
        Self { hasher }
    }
}

impl ProjectMapping for InfoPlistMapper {
    fn name(&self) -> &'static str {
        "InfoPlistMapper"
    }

    fn map(&self, mut project: Project) -> Result<(Project, Vec<SideEffectDescriptor>)> {
        let generates = |t: &Target| matches!(t.info_plist, Some(InfoPlist::Generated { .. }));
        if !project.targets.iter().any(generates) {
            return Ok((project, Vec::new()));
        }

        let directory = derived_directory(self.name(), &project)?.join("InfoPlists");
        let mut side_effects = Vec::new();
        for target in &mut project.targets {
            let Some(InfoPlist::Generated { contents }) = &target.info_plist else {
                continue;
            };
            let rendered = plist::render(contents);
            let path = directory.join(format!("{}.plist", target.name));
            debug!(
                "Transforming project {}: Info.plist of {} at {}",
                project.name,
                target.name,
                path.display()
            );
            target.info_plist = Some(InfoPlist::File {
                path: path.clone(),
                content_hash: Some(self.hasher.hash(&rendered)),
            });
            side_effects.push(SideEffectDescriptor::file(path, rendered));
        }
        Ok((project, side_effects))
    }
}

/// Injects code signing settings into targets that need them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SigningMapper;

impl SigningMapper {
    pub const CODE_SIGN_STYLE: &'static str = "CODE_SIGN_STYLE";
    pub const CODE_SIGN_IDENTITY: &'static str = "CODE_SIGN_IDENTITY";
    pub const DEVELOPMENT_TEAM: &'static str = "DEVELOPMENT_TEAM";
    pub const PROVISIONING_PROFILE_SPECIFIER: &'static str = "PROVISIONING_PROFILE_SPECIFIER";
}

impl ProjectMapping for SigningMapper {
    fn name(&self) -> &'static str {
        "SigningMapper"
    }

    fn map(&self, mut project: Project) -> Result<(Project, Vec<SideEffectDescriptor>)> {
        let Some(entries) = project.signing.clone() else {
            return Ok((project, Vec::new()));
        };

        for target in &mut project.targets {
            if !target.product.requires_signing() {
                continue;
            }
            let entry = entries.get(&target.name).ok_or_else(|| {
                mapper_error(
                    self.name(),
                    format!("{}/{}", project.name, target.name),
                    "target requires signing but has no signing entry",
                )
            })?;
            debug!(
                "Transforming project {}: signing {} for team {}",
                project.name, target.name, entry.team_id
            );
            let settings = BTreeMap::from([
                (Self::CODE_SIGN_STYLE, "Manual".to_string()),
                (Self::CODE_SIGN_IDENTITY, entry.certificate.clone()),
                (Self::DEVELOPMENT_TEAM, entry.team_id.clone()),
                (
                    Self::PROVISIONING_PROFILE_SPECIFIER,
                    entry.provisioning_profile.clone(),
                ),
            ]);
            for (key, value) in settings {
                target.settings.insert(key.to_string(), value);
            }
        }
        Ok((project, Vec::new()))
    }
}

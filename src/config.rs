// Build description handling for mrjar
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, MrjarError, Result};
use crate::identifier::LanguageVersion;
use crate::project::ProjectLayout;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildDescription {
    pub project: ProjectSection,
    #[serde(default)]
    pub archive: ArchiveSection,
    #[serde(default)]
    pub multi_release: MultiReleaseSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    pub name: String,
    pub group: Option<String>,
    pub baseline_release: Option<i64>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveSection {
    pub name: Option<String>,
    pub requires_validation: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MultiReleaseSection {
    #[serde(default)]
    pub versions: Vec<i64>,
}

impl BuildDescription {
    pub fn from_file(path: &Path) -> Result<Self> {
        let _span = tracing::debug_span!("config_loading", path = %path.display()).entered();

        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
                suggestion: Some("Create a build description (e.g. mrjar.yaml) in the project root".to_string()),
            }
            .into());
        }

        if !path.is_file() {
            return Err(ConfigError::InvalidValue {
                message: "Build description path is not a file".to_string(),
                field: "config_path".to_string(),
                value: path.display().to_string(),
                expected: "file path".to_string(),
                file_path: Some(path.to_path_buf()),
            }
            .into());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_with_context(&content, Some(path))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_yaml_with_context(yaml, None)
    }

    fn from_yaml_with_context(yaml: &str, file_path: Option<&Path>) -> Result<Self> {
        let description: BuildDescription = serde_yaml::from_str(yaml).map_err(|e| {
            let mut config_error = Box::<ConfigError>::from(e);
            if let ConfigError::InvalidYaml {
                file_path: ref mut path,
                ..
            } = *config_error
            {
                *path = file_path.map(Path::to_path_buf);
            }
            MrjarError::Config(config_error)
        })?;

        description.validate(file_path)?;
        Ok(description)
    }

    fn validate(&self, file_path: Option<&Path>) -> Result<()> {
        let mut errors = Vec::new();

        if self.project.name.trim().is_empty() {
            errors.push("project.name cannot be empty".to_string());
        }

        if let Some(release) = self.project.baseline_release {
            if let Err(e) = LanguageVersion::new(release) {
                return Err(invalid_version("project.baseline_release", release, &e, file_path));
            }
        }

        for (idx, &version) in self.multi_release.versions.iter().enumerate() {
            if let Err(e) = LanguageVersion::new(version) {
                return Err(invalid_version(
                    &format!("multi_release.versions[{idx}]"),
                    version,
                    &e,
                    file_path,
                ));
            }
        }

        if let Some(ref name) = self.archive.name {
            if name.trim().is_empty() {
                errors.push("archive.name cannot be empty when set".to_string());
            }
        }

        for (idx, dependency) in self.project.dependencies.iter().enumerate() {
            if dependency.split(':').filter(|part| !part.is_empty()).count() < 2 {
                errors.push(format!(
                    "project.dependencies[{idx}] '{dependency}' is not a group:name[:version] coordinate"
                ));
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::ValidationFailed {
                message: format!("{} problem(s) found", errors.len()),
                file_path: file_path.map(Path::to_path_buf),
                errors,
            }
            .into());
        }

        if self.multi_release.versions.is_empty() {
            tracing::debug!("Build description registers no language versions");
        }
        Ok(())
    }

    /// Baseline project layout described by this file
    pub fn layout(&self) -> ProjectLayout {
        let mut layout = ProjectLayout::new(self.project.name.clone())
            .with_dependencies(self.project.dependencies.clone());
        if let Some(ref group) = self.project.group {
            layout = layout.with_group(group.clone());
        }
        if let Some(release) = self.project.baseline_release.and_then(|r| u32::try_from(r).ok()) {
            layout = layout.with_baseline_release(release);
        }
        if let Some(ref name) = self.archive.name {
            layout = layout.with_archive_name(name.clone());
        }
        if let Some(requires) = self.archive.requires_validation {
            layout = layout.with_archive_requires_validation(requires);
        }
        layout
    }

    /// Versions to register, as written
    pub fn versions(&self) -> Vec<i64> {
        self.multi_release.versions.clone()
    }
}

fn invalid_version(field: &str, value: i64, error: &MrjarError, file_path: Option<&Path>) -> MrjarError {
    ConfigError::InvalidValue {
        message: error.to_string(),
        field: field.to_string(),
        value: value.to_string(),
        expected: "positive integer language version".to_string(),
        file_path: file_path.map(PathBuf::from),
    }
    .into()
}

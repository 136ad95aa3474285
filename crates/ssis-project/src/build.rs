//! One-shot build of a source layout into an artifact.

use std::path::{Path, PathBuf};

use ssis_model::{ParameterAssignment, ParameterSource, ProtectionLevel};

use crate::archive::ARTIFACT_EXTENSION;
use crate::error::Result;
use crate::hash::compute_file_hash;
use crate::project::{Project, default_output_path};

/// Configuration used when none is requested.
pub const DEFAULT_CONFIGURATION: &str = "Development";

/// Build settings.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Build configuration applied on load.
    pub configuration: String,
    /// Password protecting the source files.
    pub password: Option<String>,
    /// Password for the artifact; the source password when unset.
    pub new_password: Option<String>,
    /// Protection level of the artifact; the project's own level when unset.
    pub protection_level: Option<ProtectionLevel>,
    /// Directory receiving the artifact; `bin/<configuration>` next to the
    /// project definition when unset.
    pub output_dir: Option<PathBuf>,
    /// Values applied after every configuration overlay.
    pub parameters: Vec<ParameterAssignment>,
    pub version_major: Option<u32>,
    pub version_minor: Option<u32>,
    pub version_build: Option<u32>,
    pub version_comments: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            configuration: DEFAULT_CONFIGURATION.to_string(),
            password: None,
            new_password: None,
            protection_level: None,
            output_dir: None,
            parameters: Vec::new(),
            version_major: None,
            version_minor: None,
            version_build: None,
            version_comments: None,
        }
    }
}

impl BuildOptions {
    pub fn new(configuration: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_new_password(mut self, password: impl Into<String>) -> Self {
        self.new_password = Some(password.into());
        self
    }

    pub fn with_protection_level(mut self, level: ProtectionLevel) -> Self {
        self.protection_level = Some(level);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(ParameterAssignment {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_version(mut self, major: u32, minor: u32, build: u32) -> Self {
        self.version_major = Some(major);
        self.version_minor = Some(minor);
        self.version_build = Some(build);
        self
    }

    pub fn with_version_comments(mut self, comments: impl Into<String>) -> Self {
        self.version_comments = Some(comments.into());
        self
    }

    /// Password the artifact is written with.
    pub fn artifact_password(&self) -> Option<&str> {
        self.new_password.as_deref().or(self.password.as_deref())
    }
}

/// Outcome of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output_path: PathBuf,
    pub protection_level: ProtectionLevel,
    pub parameter_count: usize,
    /// SHA-256 of the written artifact.
    pub sha256: String,
}

/// Builds the project defined at `project_path` into an artifact.
pub fn build(project_path: &Path, options: &BuildOptions) -> Result<BuildReport> {
    let mut project = Project::new();
    project.load_from_source_layout(
        project_path,
        &options.configuration,
        options.password.as_deref(),
    )?;

    for assignment in &options.parameters {
        let applied = project.update_parameter(
            &assignment.name,
            Some(&assignment.value),
            ParameterSource::Manual,
        )?;
        if !applied {
            tracing::warn!(parameter = %assignment.name, "ignoring value for undeclared parameter");
        }
    }
    if let Some(major) = options.version_major {
        project.set_version_major(major)?;
    }
    if let Some(minor) = options.version_minor {
        project.set_version_minor(minor)?;
    }
    if let Some(build) = options.version_build {
        project.set_version_build(build)?;
    }
    if let Some(comments) = &options.version_comments {
        project.set_version_comments(comments)?;
    }

    let protection_level = match options.protection_level {
        Some(level) => level,
        None => project.protection_level()?,
    };
    let stem = project_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    let output_path = match &options.output_dir {
        Some(dir) => dir.join(format!("{stem}.{ARTIFACT_EXTENSION}")),
        None => default_output_path(project_path, &options.configuration, &stem),
    };

    project.save_with_protection(&output_path, protection_level, options.artifact_password())?;
    let sha256 = compute_file_hash(&output_path)?;
    let parameter_count = project.parameters().map_or(0, |table| table.len());

    tracing::info!(
        output = %output_path.display(),
        configuration = %options.configuration,
        protection_level = %protection_level,
        sha256 = %sha256,
        "Build complete"
    );
    Ok(BuildReport {
        output_path,
        protection_level,
        parameter_count,
        sha256,
    })
}

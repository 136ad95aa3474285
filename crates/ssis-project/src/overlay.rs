//! Named configuration blocks layered over the declared parameter values.
//!
//! Two documents carry them: the project definition (`*.dtproj`) holds the
//! build configurations, and the optional per-user sibling
//! (`*.dtproj.user`) lists parameters whose sensitive values are kept
//! locally. User values are never carried into a build, so every value read
//! from the user document is null.

use std::fs;
use std::path::{Path, PathBuf};

use ssis_model::ParameterSource;

use crate::codec;
use crate::error::{ProjectError, Result};
use crate::xml::{self, XmlElement};

/// Which document an overlay was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// Build configuration in the project definition.
    Build,
    /// Per-user configuration sibling.
    User,
}

impl OverlayKind {
    const fn root(&self) -> &'static str {
        match self {
            OverlayKind::Build => "Project",
            OverlayKind::User => "DataTransformationsUserConfiguration",
        }
    }

    const fn settings(&self) -> &'static str {
        match self {
            OverlayKind::Build => "ParameterConfigurationValues",
            OverlayKind::User => "ParameterConfigurationSensitiveValues",
        }
    }

    /// Source recorded on parameters this overlay sets.
    pub const fn source(&self) -> ParameterSource {
        match self {
            OverlayKind::Build => ParameterSource::Configuration,
            OverlayKind::User => ParameterSource::UserConfiguration,
        }
    }
}

/// One override from a configuration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationValue {
    pub name: String,
    pub value: Option<String>,
}

/// Overrides of one named configuration.
#[derive(Debug, Clone)]
pub struct ConfigurationOverlay {
    kind: OverlayKind,
    configuration: String,
    values: Vec<ConfigurationValue>,
}

impl ConfigurationOverlay {
    /// Reads the block named `configuration` from the document at `path`.
    pub fn read(
        kind: OverlayKind,
        path: &Path,
        configuration: &str,
        password: Option<&str>,
    ) -> Result<Self> {
        if !path.is_file() {
            return Err(ProjectError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = fs::read(path).map_err(|e| ProjectError::io("read", path, e))?;
        let root = xml::parse(&bytes).map_err(|e| e.for_file(&file_label(path)))?;
        Self::from_document(kind, &root, path, configuration, password)
    }

    /// Extracts the block from an already parsed document. `path` is only
    /// used for error context.
    pub fn from_document(
        kind: OverlayKind,
        root: &XmlElement,
        path: &Path,
        configuration: &str,
        password: Option<&str>,
    ) -> Result<Self> {
        if root.local_name() != kind.root() {
            return Err(ProjectError::invalid(
                file_label(path),
                format!("expected <{}> root, found <{}>", kind.root(), root.name),
            ));
        }
        let block = root
            .child("Configurations")
            .and_then(|configurations| {
                configurations
                    .children("Configuration")
                    .find(|candidate| setting_name(candidate).as_deref() == Some(configuration))
            })
            .ok_or_else(|| ProjectError::ConfigurationNotFound {
                name: configuration.to_string(),
                path: path.to_path_buf(),
            })?;

        let values = match block.path(&["Options", kind.settings()]) {
            Some(settings) => {
                let mut settings = settings.clone();
                if kind == OverlayKind::Build {
                    codec::decrypt_fields(&mut settings, password)
                        .map_err(|e| e.for_file(&file_label(path)))?;
                }
                settings
                    .children("ConfigurationSetting")
                    .filter_map(|setting| {
                        let name = setting_name(setting)?;
                        let value = match kind {
                            OverlayKind::Build => setting_value(setting),
                            OverlayKind::User => None,
                        };
                        Some(ConfigurationValue { name, value })
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        tracing::debug!(
            path = %path.display(),
            configuration,
            kind = ?kind,
            values = values.len(),
            "read configuration overlay"
        );
        Ok(Self {
            kind,
            configuration: configuration.to_string(),
            values,
        })
    }

    pub fn kind(&self) -> OverlayKind {
        self.kind
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn values(&self) -> &[ConfigurationValue] {
        &self.values
    }

    pub fn source(&self) -> ParameterSource {
        self.kind.source()
    }
}

/// Path of the per-user sibling of a project definition.
pub fn user_document_path(project_path: &Path) -> PathBuf {
    let mut path = project_path.as_os_str().to_owned();
    path.push(".user");
    PathBuf::from(path)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `Name` of a configuration or setting, as a child element or attribute.
fn setting_name(element: &XmlElement) -> Option<String> {
    match element.child("Name") {
        Some(name) => Some(name.text().trim().to_string()),
        None => element.attribute_local("Name").map(str::to_string),
    }
}

fn setting_value(setting: &XmlElement) -> Option<String> {
    match setting.child("Value") {
        Some(value) if value.attribute_local("nil") == Some("true") => None,
        Some(value) => Some(value.text()),
        None => setting.attribute_local("Value").map(str::to_string),
    }
}

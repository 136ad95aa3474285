//! Project parameters and the sources that set them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Where a parameter's current value came from.
///
/// Variants are ordered from lowest to highest precedence, so sources can be
/// compared directly (`Configuration > Default`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ParameterSource {
    /// Declared in the manifest or params file.
    #[default]
    Default,
    /// Named build configuration of the project definition.
    Configuration,
    /// Local user configuration overlay.
    UserConfiguration,
    /// Supplied explicitly at build time.
    Manual,
}

impl ParameterSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParameterSource::Default => "Default",
            ParameterSource::Configuration => "Configuration",
            ParameterSource::UserConfiguration => "UserConfiguration",
            ParameterSource::Manual => "Manual",
        }
    }
}

impl fmt::Display for ParameterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterSource {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(ParameterSource::Default),
            "configuration" => Ok(ParameterSource::Configuration),
            "userconfiguration" => Ok(ParameterSource::UserConfiguration),
            "manual" => Ok(ParameterSource::Manual),
            _ => Err(ModelError::InvalidParameterSource {
                value: s.to_string(),
            }),
        }
    }
}

/// A resolved project parameter.
///
/// The name is the identity. Sensitivity is fixed by the declaring file;
/// value and source change as overlays are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    value: Option<String>,
    sensitive: bool,
    source: ParameterSource,
}

impl Parameter {
    /// Creates a parameter as declared by a project file.
    pub fn declared(name: impl Into<String>, value: Option<String>, sensitive: bool) -> Self {
        Self {
            name: name.into(),
            value,
            sensitive,
            source: ParameterSource::Default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    pub fn source(&self) -> ParameterSource {
        self.source
    }

    /// Replaces the value and records the writing source.
    pub fn set(&mut self, value: Option<String>, source: ParameterSource) {
        self.value = value;
        self.source = source;
    }

    /// Value suitable for display; sensitive values are masked.
    pub fn display_value(&self) -> &str {
        match (&self.value, self.sensitive) {
            (None, _) => "<null>",
            (Some(_), true) => "********",
            (Some(value), false) => value,
        }
    }
}

/// A `NAME=VALUE` override supplied from outside the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterAssignment {
    pub name: String,
    pub value: String,
}

impl FromStr for ParameterAssignment {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s.split_once('=').ok_or_else(|| ModelError::InvalidAssignment {
            value: s.to_string(),
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::InvalidAssignment {
                value: s.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

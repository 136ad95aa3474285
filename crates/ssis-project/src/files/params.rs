//! The project parameters file (`Project.params`).

use ssis_model::{Parameter, ProtectionLevel};

use super::parameters::{declared_name, mark_sensitive_value, read_parameter, write_value};
use super::{ProjectDocument, ProjectFileKind};
use crate::error::{ProjectError, Result};
use crate::xml::XmlElement;

/// Prefix of project-scoped parameter names.
pub const PROJECT_SCOPE: &str = "Project::";

/// Project parameter declarations.
#[derive(Debug, Clone)]
pub struct ProjectParams {
    name: String,
    document: XmlElement,
}

impl ProjectParams {
    /// Declared parameters keyed `Project::<name>`, in document order.
    pub fn parameters(&self) -> Vec<Parameter> {
        self.document
            .children("Parameter")
            .filter_map(|element| {
                let name = declared_name(element)?;
                Some(read_parameter(element, format!("{PROJECT_SCOPE}{name}")))
            })
            .collect()
    }

    /// Writes a value back into the declaration of `key`. Returns false if
    /// this file does not declare it.
    pub fn set_parameter_value(&mut self, key: &str, value: Option<&str>) -> bool {
        let Some(name) = key.strip_prefix(PROJECT_SCOPE) else {
            return false;
        };
        match self
            .document
            .children_mut("Parameter")
            .find(|element| declared_name(element) == Some(name))
        {
            Some(element) => {
                write_value(element, value);
                true
            }
            None => false,
        }
    }
}

impl ProjectDocument for ProjectParams {
    const KIND: ProjectFileKind = ProjectFileKind::Params;

    fn from_document(name: &str, mut document: XmlElement) -> Result<Self> {
        if document.local_name() != "Parameters" {
            return Err(ProjectError::invalid(
                name,
                format!("expected a Parameters document, found <{}>", document.name),
            ));
        }
        for element in document.children_mut("Parameter") {
            mark_sensitive_value(element);
        }
        Ok(Self {
            name: name.to_string(),
            document,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&self, _level: ProtectionLevel) -> XmlElement {
        self.document.clone()
    }
}

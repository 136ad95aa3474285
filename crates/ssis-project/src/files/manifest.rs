//! The project manifest (`@Project.manifest`).
//!
//! Besides project metadata the manifest lists the connection managers and
//! packages of the project, which drives load order for source layouts, and
//! declares connection-manager and package parameters.

use std::str::FromStr;

use ssis_model::{Parameter, ProtectionLevel};

use super::parameters::{
    declared_name, ensure_property, mark_sensitive_value, prefix_of, property, read_parameter,
    write_value,
};
use super::{ProjectDocument, ProjectFileKind};
use crate::error::{ProjectError, Result};
use crate::xml::XmlElement;

const PACKAGE_SCOPE_SEPARATOR: &str = "::";

/// Project manifest.
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    name: String,
    document: XmlElement,
}

impl ProjectManifest {
    /// Raw protection level name as stored in the manifest.
    pub fn protection_level_name(&self) -> Option<&str> {
        self.document.attribute_local("ProtectionLevel")
    }

    /// Protection level the project was saved with.
    pub fn protection_level(&self) -> Result<ProtectionLevel> {
        match self.protection_level_name() {
            Some(name) => Ok(ProtectionLevel::from_str(name)?),
            None => Ok(ProtectionLevel::default()),
        }
    }

    /// Metadata property text, if declared.
    pub fn property(&self, name: &str) -> Option<String> {
        property(&self.document, name).map(XmlElement::text)
    }

    pub fn set_property(&mut self, name: &str, value: &str) {
        ensure_property(&mut self.document, name).set_text(Some(value));
    }

    pub fn project_name(&self) -> Option<String> {
        self.property("Name")
    }

    pub fn version_major(&self) -> Option<u32> {
        self.numeric_property("VersionMajor")
    }

    pub fn version_minor(&self) -> Option<u32> {
        self.numeric_property("VersionMinor")
    }

    pub fn version_build(&self) -> Option<u32> {
        self.numeric_property("VersionBuild")
    }

    pub fn version_comments(&self) -> Option<String> {
        self.property("VersionComments")
    }

    pub fn description(&self) -> Option<String> {
        self.property("Description")
    }

    fn numeric_property(&self, name: &str) -> Option<u32> {
        self.property(name)?.trim().parse().ok()
    }

    /// Connection manager file names in declared order.
    pub fn connection_names(&self) -> Vec<String> {
        self.declared_names("ConnectionManagers", "ConnectionManager")
    }

    /// Package file names in declared order.
    pub fn package_names(&self) -> Vec<String> {
        self.declared_names("Packages", "Package")
    }

    fn declared_names(&self, group: &str, item: &str) -> Vec<String> {
        self.document
            .child(group)
            .map(|group| {
                group
                    .children(item)
                    .filter_map(declared_name)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Connection-manager parameters (keyed by their declared name) followed
    /// by package parameters (keyed `<package>::<name>`).
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        if let Some(group) = self
            .document
            .path(&["DeploymentInfo", "ProjectConnectionParameters"])
        {
            for element in group.children("Parameter") {
                if let Some(name) = declared_name(element) {
                    parameters.push(read_parameter(element, name.to_string()));
                }
            }
        }
        if let Some(info) = self.document.path(&["DeploymentInfo", "PackageInfo"]) {
            for package in info.children("PackageMetaData") {
                let Some(package_name) = declared_name(package) else {
                    continue;
                };
                let Some(group) = package.child("Parameters") else {
                    continue;
                };
                for element in group.children("Parameter") {
                    if let Some(name) = declared_name(element) {
                        let key = format!("{package_name}{PACKAGE_SCOPE_SEPARATOR}{name}");
                        parameters.push(read_parameter(element, key));
                    }
                }
            }
        }
        parameters
    }

    /// Writes a value back into the declaration of `key`. Returns false if
    /// the manifest does not declare it.
    pub fn set_parameter_value(&mut self, key: &str, value: Option<&str>) -> bool {
        let mut written = false;
        if let Some(group) = self
            .document
            .path_mut(&["DeploymentInfo", "ProjectConnectionParameters"])
        {
            for element in group.children_mut("Parameter") {
                if declared_name(element) == Some(key) {
                    write_value(element, value);
                    written = true;
                }
            }
        }
        if let Some((package_name, name)) = key.split_once(PACKAGE_SCOPE_SEPARATOR) {
            if let Some(info) = self.document.path_mut(&["DeploymentInfo", "PackageInfo"]) {
                for package in info.children_mut("PackageMetaData") {
                    if declared_name(package) != Some(package_name) {
                        continue;
                    }
                    let Some(group) = package.child_mut("Parameters") else {
                        continue;
                    };
                    for element in group.children_mut("Parameter") {
                        if declared_name(element) == Some(name) {
                            write_value(element, value);
                            written = true;
                        }
                    }
                }
            }
        }
        written
    }

    fn for_each_declaration(document: &mut XmlElement, visit: fn(&mut XmlElement)) {
        if let Some(group) = document.path_mut(&["DeploymentInfo", "ProjectConnectionParameters"]) {
            group.children_mut("Parameter").for_each(visit);
        }
        if let Some(info) = document.path_mut(&["DeploymentInfo", "PackageInfo"]) {
            for package in info.children_mut("PackageMetaData") {
                if let Some(group) = package.child_mut("Parameters") {
                    group.children_mut("Parameter").for_each(visit);
                }
            }
        }
    }
}

impl ProjectDocument for ProjectManifest {
    const KIND: ProjectFileKind = ProjectFileKind::Manifest;

    fn from_document(name: &str, mut document: XmlElement) -> Result<Self> {
        if document.local_name() != "Project" {
            return Err(ProjectError::invalid(
                name,
                format!("expected a Project manifest, found <{}>", document.name),
            ));
        }
        if document.child("Properties").is_none() {
            return Err(ProjectError::invalid(name, "manifest has no Properties"));
        }
        Self::for_each_declaration(&mut document, mark_sensitive_value);
        Ok(Self {
            name: name.to_string(),
            document,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&self, level: ProtectionLevel) -> XmlElement {
        let mut document = self.document.clone();
        if !document.replace_attribute_local("ProtectionLevel", level.as_str()) {
            let attribute = format!("{}ProtectionLevel", prefix_of(&document));
            document.set_attribute(attribute, level.as_str());
        }
        document
    }
}

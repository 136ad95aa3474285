//! Connection managers and packages.
//!
//! Their content is not interpreted beyond the root element; they are only
//! decrypted, re-encrypted and carried into the artifact.

use ssis_model::ProtectionLevel;

use super::{ProjectDocument, ProjectFileKind};
use crate::error::{ProjectError, Result};
use crate::xml::XmlElement;

fn expect_root(name: &str, document: &XmlElement, expected: &str) -> Result<()> {
    if document.local_name() == expected {
        Ok(())
    } else {
        Err(ProjectError::invalid(
            name,
            format!("expected <{expected}> root, found <{}>", document.name),
        ))
    }
}

/// Rewrites a numeric `ProtectionLevel` attribute on the root, if present.
fn stamp_level(document: &XmlElement, level: ProtectionLevel) -> XmlElement {
    let mut document = document.clone();
    document.replace_attribute_local("ProtectionLevel", level.code().to_string());
    document
}

/// A shared connection manager (`*.conmgr`).
#[derive(Debug, Clone)]
pub struct ConnectionFile {
    name: String,
    document: XmlElement,
}

impl ProjectDocument for ConnectionFile {
    const KIND: ProjectFileKind = ProjectFileKind::Connection;

    fn from_document(name: &str, document: XmlElement) -> Result<Self> {
        expect_root(name, &document, "ConnectionManager")?;
        Ok(Self {
            name: name.to_string(),
            document,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&self, level: ProtectionLevel) -> XmlElement {
        stamp_level(&self.document, level)
    }
}

/// An executable package (`*.dtsx`).
#[derive(Debug, Clone)]
pub struct PackageFile {
    name: String,
    document: XmlElement,
}

impl ProjectDocument for PackageFile {
    const KIND: ProjectFileKind = ProjectFileKind::Package;

    fn from_document(name: &str, document: XmlElement) -> Result<Self> {
        expect_root(name, &document, "Executable")?;
        Ok(Self {
            name: name.to_string(),
            document,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&self, level: ProtectionLevel) -> XmlElement {
        stamp_level(&self.document, level)
    }
}

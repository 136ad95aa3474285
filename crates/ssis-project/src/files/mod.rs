//! Project files: the four kinds of document a project is made of.
//!
//! Each kind implements [`ProjectDocument`], the shared initialize/save
//! capability. [`ProjectFile`] is the closed union used when the kind is only
//! known at runtime, e.g. while reading archive entries.

mod manifest;
mod opaque;
mod parameters;
mod params;

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use ssis_model::ProtectionLevel;

use crate::codec;
use crate::error::{ProjectError, Result};
use crate::xml::XmlElement;

pub use manifest::ProjectManifest;
pub use opaque::{ConnectionFile, PackageFile};
pub use params::ProjectParams;

/// Namespace of manifest and params documents.
pub const SSIS_NAMESPACE: &str = "www.microsoft.com/SqlServer/SSIS";

/// Kind of a project file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectFileKind {
    Manifest,
    Params,
    Connection,
    Package,
}

impl ProjectFileKind {
    pub const fn extension(&self) -> &'static str {
        match self {
            ProjectFileKind::Manifest => "manifest",
            ProjectFileKind::Params => "params",
            ProjectFileKind::Connection => "conmgr",
            ProjectFileKind::Package => "dtsx",
        }
    }

    /// Classifies a file name by its extension (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, extension) = name.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "manifest" => Some(ProjectFileKind::Manifest),
            "params" => Some(ProjectFileKind::Params),
            "conmgr" => Some(ProjectFileKind::Connection),
            "dtsx" => Some(ProjectFileKind::Package),
            _ => None,
        }
    }
}

/// Shared load/save contract of every project file kind.
pub trait ProjectDocument: Sized {
    const KIND: ProjectFileKind;

    /// Builds the file from a decoded payload, validating its shape.
    fn from_document(name: &str, document: XmlElement) -> Result<Self>;

    /// Logical, project-relative file name.
    fn name(&self) -> &str;

    /// Payload to persist under `level`, with level markers stamped in.
    fn prepare(&self, level: ProtectionLevel) -> XmlElement;

    /// Reads, decrypts and validates a payload from a stream.
    fn initialize<R: Read>(name: &str, mut reader: R, password: Option<&str>) -> Result<Self> {
        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .map_err(|e| ProjectError::io("read", name, e))?;
        let document = codec::decode(&raw, password).map_err(|e| e.for_file(name))?;
        let file = Self::from_document(name, document)?;
        tracing::debug!(file = name, kind = ?Self::KIND, "initialized project file");
        Ok(file)
    }

    /// Opens `path` and initializes the file under the logical `name`.
    fn open(path: &Path, name: &str, password: Option<&str>) -> Result<Self> {
        if !path.is_file() {
            return Err(ProjectError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|e| ProjectError::io("open", path, e))?;
        Self::initialize(name, BufReader::new(file), password)
    }

    /// Encodes the payload under `level` and writes it to `writer`.
    fn save<W: Write>(
        &self,
        writer: &mut W,
        level: ProtectionLevel,
        password: Option<&str>,
    ) -> Result<()> {
        let bytes = codec::encode(&self.prepare(level), level, password)
            .map_err(|e| e.for_file(self.name()))?;
        writer
            .write_all(&bytes)
            .map_err(|e| ProjectError::io("write", self.name(), e))
    }
}

/// A project file of any kind.
#[derive(Debug, Clone)]
pub enum ProjectFile {
    Manifest(ProjectManifest),
    Params(ProjectParams),
    Connection(ConnectionFile),
    Package(PackageFile),
}

impl ProjectFile {
    /// Initializes a file of the given kind from a stream.
    pub fn initialize<R: Read>(
        kind: ProjectFileKind,
        name: &str,
        reader: R,
        password: Option<&str>,
    ) -> Result<Self> {
        Ok(match kind {
            ProjectFileKind::Manifest => {
                ProjectFile::Manifest(ProjectManifest::initialize(name, reader, password)?)
            }
            ProjectFileKind::Params => {
                ProjectFile::Params(ProjectParams::initialize(name, reader, password)?)
            }
            ProjectFileKind::Connection => {
                ProjectFile::Connection(ConnectionFile::initialize(name, reader, password)?)
            }
            ProjectFileKind::Package => {
                ProjectFile::Package(PackageFile::initialize(name, reader, password)?)
            }
        })
    }

    pub fn kind(&self) -> ProjectFileKind {
        match self {
            ProjectFile::Manifest(_) => ProjectFileKind::Manifest,
            ProjectFile::Params(_) => ProjectFileKind::Params,
            ProjectFile::Connection(_) => ProjectFileKind::Connection,
            ProjectFile::Package(_) => ProjectFileKind::Package,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ProjectFile::Manifest(file) => file.name(),
            ProjectFile::Params(file) => file.name(),
            ProjectFile::Connection(file) => file.name(),
            ProjectFile::Package(file) => file.name(),
        }
    }

    pub fn save<W: Write>(
        &self,
        writer: &mut W,
        level: ProtectionLevel,
        password: Option<&str>,
    ) -> Result<()> {
        match self {
            ProjectFile::Manifest(file) => file.save(writer, level, password),
            ProjectFile::Params(file) => file.save(writer, level, password),
            ProjectFile::Connection(file) => file.save(writer, level, password),
            ProjectFile::Package(file) => file.save(writer, level, password),
        }
    }
}

//! The project aggregate: loading, parameter resolution and artifact assembly.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use ssis_model::{ParameterSource, ParameterTable, ProtectionLevel};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::archive::{
    self, ARTIFACT_EXTENSION, CONTENT_TYPES, CONTENT_TYPES_ENTRY, MANIFEST_ENTRY, PARAMS_ENTRY,
};
use crate::codec;
use crate::error::{ProjectError, Result};
use crate::files::{
    ConnectionFile, PackageFile, ProjectDocument, ProjectFile, ProjectFileKind, ProjectManifest,
    ProjectParams,
};
use crate::overlay::{self, ConfigurationOverlay, OverlayKind};
use crate::xml::{self, XmlElement};

/// Deployment model accepted in project definitions.
const PROJECT_DEPLOYMENT_MODEL: &str = "Project";

/// Label used in archive errors when writing to a caller's stream.
const STREAM_LABEL: &str = "<stream>";

#[derive(Debug, Default)]
enum ProjectState {
    #[default]
    Uninitialized,
    Loaded(Box<LoadedProject>),
}

#[derive(Debug)]
struct LoadedProject {
    manifest: ProjectManifest,
    params: ProjectParams,
    connections: Vec<ConnectionFile>,
    packages: Vec<PackageFile>,
    parameters: ParameterTable,
}

impl LoadedProject {
    /// Builds the table from the declaring files. Manifest declarations are
    /// merged last and win on a name collision.
    fn new(
        manifest: ProjectManifest,
        params: ProjectParams,
        connections: Vec<ConnectionFile>,
        packages: Vec<PackageFile>,
    ) -> Self {
        let mut parameters = ParameterTable::new();
        parameters.extend(params.parameters());
        parameters.extend(manifest.parameters());
        Self {
            manifest,
            params,
            connections,
            packages,
            parameters,
        }
    }

    /// Updates the table and the declaring documents. Returns false for
    /// undeclared names.
    fn assign(&mut self, name: &str, value: Option<&str>, source: ParameterSource) -> bool {
        if !self
            .parameters
            .update(name, value.map(str::to_string), source)
        {
            return false;
        }
        self.params.set_parameter_value(name, value);
        self.manifest.set_parameter_value(name, value);
        true
    }

    fn apply_overlay(&mut self, overlay: &ConfigurationOverlay) {
        for setting in overlay.values() {
            if !self.assign(&setting.name, setting.value.as_deref(), overlay.source()) {
                tracing::warn!(
                    parameter = %setting.name,
                    configuration = overlay.configuration(),
                    "ignoring override for undeclared parameter"
                );
            }
        }
    }
}

/// An SSIS project in either its source or its packaged form.
///
/// A new project is uninitialized; every mutation and save fails with
/// [`ProjectError::NotLoaded`] until one of the load operations succeeds.
/// A failed load leaves the project as it was.
#[derive(Debug, Default)]
pub struct Project {
    state: ProjectState,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a project from a packaged artifact.
    ///
    /// Parameters keep the values stored in the artifact; no configuration
    /// overlay is applied.
    pub fn load_from_archive(&mut self, path: &Path, password: Option<&str>) -> Result<()> {
        if !path.is_file() {
            return Err(ProjectError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|e| ProjectError::io("open", path, e))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| ProjectError::archive(path, e))?;

        let mut manifest = None;
        let mut params = None;
        let mut connections = Vec::new();
        let mut packages = Vec::new();

        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| ProjectError::archive(path, e))?;
            if entry.is_dir() {
                continue;
            }
            let name = archive::logical_name(entry.name())?;
            if archive::is_metadata_entry(&name) {
                tracing::debug!(entry = %name, "skipping archive metadata");
                continue;
            }
            let kind = ProjectFileKind::from_name(&name)
                .ok_or_else(|| ProjectError::UnexpectedEntry { name: name.clone() })?;
            let duplicate = match kind {
                ProjectFileKind::Manifest => name != MANIFEST_ENTRY || manifest.is_some(),
                ProjectFileKind::Params => name != PARAMS_ENTRY || params.is_some(),
                ProjectFileKind::Connection | ProjectFileKind::Package => false,
            };
            if duplicate {
                return Err(ProjectError::UnexpectedEntry { name });
            }
            match ProjectFile::initialize(kind, &name, entry, password)? {
                ProjectFile::Manifest(file) => manifest = Some(file),
                ProjectFile::Params(file) => params = Some(file),
                ProjectFile::Connection(file) => connections.push(file),
                ProjectFile::Package(file) => packages.push(file),
            }
        }

        let manifest = manifest.ok_or_else(|| ProjectError::MissingEntry {
            name: MANIFEST_ENTRY.to_string(),
        })?;
        let params = params.ok_or_else(|| ProjectError::MissingEntry {
            name: PARAMS_ENTRY.to_string(),
        })?;
        let loaded = LoadedProject::new(manifest, params, connections, packages);

        tracing::info!(
            path = %path.display(),
            packages = loaded.packages.len(),
            connections = loaded.connections.len(),
            parameters = loaded.parameters.len(),
            "Loaded project archive"
        );
        self.state = ProjectState::Loaded(Box::new(loaded));
        Ok(())
    }

    /// Loads a project from its project definition (`*.dtproj`) and the
    /// files next to it, then applies the named build configuration and the
    /// optional per-user overlay.
    pub fn load_from_source_layout(
        &mut self,
        path: &Path,
        configuration: &str,
        password: Option<&str>,
    ) -> Result<()> {
        if !path.is_file() {
            return Err(ProjectError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let label = file_label(path);
        let bytes = fs::read(path).map_err(|e| ProjectError::io("read", path, e))?;
        let definition = xml::parse(&bytes).map_err(|e| e.for_file(&label))?;

        let model = definition
            .child("DeploymentModel")
            .map(|model| model.text().trim().to_string())
            .unwrap_or_default();
        if model != PROJECT_DEPLOYMENT_MODEL {
            return Err(ProjectError::UnsupportedDeploymentModel {
                found: if model.is_empty() {
                    "(none)".to_string()
                } else {
                    model
                },
            });
        }

        let fragment = embedded_manifest(&definition)
            .ok_or_else(|| ProjectError::invalid(&label, "no embedded project manifest"))?;
        let document = codec::decode_element(fragment, password).map_err(|e| e.for_file(&label))?;
        let manifest = ProjectManifest::from_document(MANIFEST_ENTRY, document)?;

        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        let params = ProjectParams::open(&directory.join(PARAMS_ENTRY), PARAMS_ENTRY, password)?;
        let connections = manifest
            .connection_names()
            .iter()
            .map(|name| ConnectionFile::open(&directory.join(name), name, password))
            .collect::<Result<Vec<_>>>()?;
        let packages = manifest
            .package_names()
            .iter()
            .map(|name| PackageFile::open(&directory.join(name), name, password))
            .collect::<Result<Vec<_>>>()?;
        let mut loaded = LoadedProject::new(manifest, params, connections, packages);

        let build = ConfigurationOverlay::from_document(
            OverlayKind::Build,
            &definition,
            path,
            configuration,
            password,
        )?;
        loaded.apply_overlay(&build);

        let user_path = overlay::user_document_path(path);
        if user_path.is_file() {
            let user =
                ConfigurationOverlay::read(OverlayKind::User, &user_path, configuration, password)?;
            loaded.apply_overlay(&user);
        } else {
            tracing::debug!(path = %user_path.display(), "no user configuration");
        }

        tracing::info!(
            path = %path.display(),
            configuration,
            packages = loaded.packages.len(),
            connections = loaded.connections.len(),
            parameters = loaded.parameters.len(),
            "Loaded project source"
        );
        self.state = ProjectState::Loaded(Box::new(loaded));
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ProjectState::Loaded(_))
    }

    fn loaded(&self) -> Result<&LoadedProject> {
        match &self.state {
            ProjectState::Loaded(project) => Ok(&**project),
            ProjectState::Uninitialized => Err(ProjectError::NotLoaded),
        }
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedProject> {
        match &mut self.state {
            ProjectState::Loaded(project) => Ok(&mut **project),
            ProjectState::Uninitialized => Err(ProjectError::NotLoaded),
        }
    }

    /// Sets a parameter value. Returns `Ok(false)` when no file declares
    /// `name`.
    pub fn update_parameter(
        &mut self,
        name: &str,
        value: Option<&str>,
        source: ParameterSource,
    ) -> Result<bool> {
        Ok(self.loaded_mut()?.assign(name, value, source))
    }

    /// Resolved parameters, or `None` before a load.
    pub fn parameters(&self) -> Option<&ParameterTable> {
        self.loaded().ok().map(|project| &project.parameters)
    }

    /// Protection level recorded in the manifest.
    pub fn protection_level(&self) -> Result<ProtectionLevel> {
        self.loaded()?.manifest.protection_level()
    }

    pub fn name(&self) -> Option<String> {
        self.loaded().ok()?.manifest.project_name()
    }

    pub fn version_major(&self) -> Option<u32> {
        self.loaded().ok()?.manifest.version_major()
    }

    pub fn version_minor(&self) -> Option<u32> {
        self.loaded().ok()?.manifest.version_minor()
    }

    pub fn version_build(&self) -> Option<u32> {
        self.loaded().ok()?.manifest.version_build()
    }

    pub fn version_comments(&self) -> Option<String> {
        self.loaded().ok()?.manifest.version_comments()
    }

    pub fn description(&self) -> Option<String> {
        self.loaded().ok()?.manifest.description()
    }

    pub fn set_version_major(&mut self, value: u32) -> Result<()> {
        self.set_property("VersionMajor", &value.to_string())
    }

    pub fn set_version_minor(&mut self, value: u32) -> Result<()> {
        self.set_property("VersionMinor", &value.to_string())
    }

    pub fn set_version_build(&mut self, value: u32) -> Result<()> {
        self.set_property("VersionBuild", &value.to_string())
    }

    pub fn set_version_comments(&mut self, value: &str) -> Result<()> {
        self.set_property("VersionComments", value)
    }

    pub fn set_description(&mut self, value: &str) -> Result<()> {
        self.set_property("Description", value)
    }

    fn set_property(&mut self, name: &str, value: &str) -> Result<()> {
        self.loaded_mut()?.manifest.set_property(name, value);
        Ok(())
    }

    /// Connection manager file names in load order.
    pub fn connection_names(&self) -> Vec<&str> {
        self.loaded()
            .map(|project| project.connections.iter().map(|file| file.name()).collect())
            .unwrap_or_default()
    }

    /// Package file names in load order.
    pub fn package_names(&self) -> Vec<&str> {
        self.loaded()
            .map(|project| project.packages.iter().map(|file| file.name()).collect())
            .unwrap_or_default()
    }

    /// Saves the artifact without a password; sensitive values are dropped.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.save_with_protection(path, ProtectionLevel::DontSaveSensitive, None)
    }

    /// Saves the artifact to `path`, replacing any existing file atomically.
    ///
    /// Every file in the artifact is written with the same protection level
    /// and password.
    pub fn save_with_protection(
        &self,
        path: &Path,
        level: ProtectionLevel,
        password: Option<&str>,
    ) -> Result<()> {
        let project = self.loaded()?;
        let has_extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case(ARTIFACT_EXTENSION));
        if !has_extension {
            return Err(ProjectError::WrongExtension {
                path: path.to_path_buf(),
                expected: ARTIFACT_EXTENSION,
            });
        }
        if level.requires_password() && password.is_none_or(str::is_empty) {
            return Err(ProjectError::MissingPassword { level });
        }

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ProjectError::io("create directory", parent, e))?;
        }

        let temp_path = path.with_extension(format!("{ARTIFACT_EXTENSION}.tmp"));
        if let Err(error) = write_temp(project, &temp_path, level, password) {
            let _ = fs::remove_file(&temp_path);
            return Err(error);
        }

        if let Err(source) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(ProjectError::AtomicWriteFailed {
                temp_path,
                target_path: path.to_path_buf(),
                source,
            });
        }

        tracing::info!(
            path = %path.display(),
            protection_level = %level,
            "Saved project artifact"
        );
        Ok(())
    }

    /// Writes the artifact to a stream and returns the stream.
    pub fn save_to_writer<W: Write + Seek>(
        &self,
        writer: W,
        level: ProtectionLevel,
        password: Option<&str>,
    ) -> Result<W> {
        write_archive(self.loaded()?, writer, level, password, Path::new(STREAM_LABEL))
    }
}

fn write_temp(
    project: &LoadedProject,
    temp_path: &Path,
    level: ProtectionLevel,
    password: Option<&str>,
) -> Result<()> {
    let file = File::create(temp_path).map_err(|e| ProjectError::io("create", temp_path, e))?;
    let writer = write_archive(project, BufWriter::new(file), level, password, temp_path)?;
    let file = writer
        .into_inner()
        .map_err(|e| ProjectError::io("write", temp_path, e.into_error()))?;
    file.sync_all()
        .map_err(|e| ProjectError::io("sync", temp_path, e))
}

fn write_archive<W: Write + Seek>(
    project: &LoadedProject,
    writer: W,
    level: ProtectionLevel,
    password: Option<&str>,
    label: &Path,
) -> Result<W> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    zip.start_file(MANIFEST_ENTRY, options)
        .map_err(|e| ProjectError::archive(label, e))?;
    project.manifest.save(&mut zip, level, password)?;

    zip.start_file(PARAMS_ENTRY, options)
        .map_err(|e| ProjectError::archive(label, e))?;
    project.params.save(&mut zip, level, password)?;

    zip.start_file(CONTENT_TYPES_ENTRY, options)
        .map_err(|e| ProjectError::archive(label, e))?;
    zip.write_all(CONTENT_TYPES.as_bytes())
        .map_err(|e| ProjectError::io("write", label, e))?;

    for connection in &project.connections {
        write_entry(&mut zip, connection, options, level, password, label)?;
    }
    for package in &project.packages {
        write_entry(&mut zip, package, options, level, password, label)?;
    }

    zip.finish().map_err(|e| ProjectError::archive(label, e))
}

fn write_entry<W: Write + Seek, D: ProjectDocument>(
    zip: &mut ZipWriter<W>,
    file: &D,
    options: SimpleFileOptions,
    level: ProtectionLevel,
    password: Option<&str>,
    label: &Path,
) -> Result<()> {
    let part = archive::part_name(file.name());
    tracing::debug!(file = file.name(), entry = %part, "writing archive entry");
    zip.start_file(part, options)
        .map_err(|e| ProjectError::archive(label, e))?;
    file.save(zip, level, password)
}

/// The manifest embedded in a project definition, with the namespace
/// declarations of the definition root carried onto it.
fn embedded_manifest(definition: &XmlElement) -> Option<XmlElement> {
    let mut fragment = definition
        .path(&["DeploymentModelSpecificContent", "Manifest"])?
        .elements()
        .next()?
        .clone();
    for (key, value) in &definition.attributes {
        if key.starts_with("xmlns") && fragment.attribute(key).is_none() {
            fragment.attributes.push((key.clone(), value.clone()));
        }
    }
    Some(fragment)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Default artifact path for a project definition and configuration:
/// `bin/<configuration>/<stem>.ispac` next to the definition.
pub fn default_output_path(project_path: &Path, configuration: &str, name: &str) -> PathBuf {
    project_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("bin")
        .join(configuration)
        .join(format!("{name}.{ARTIFACT_EXTENSION}"))
}

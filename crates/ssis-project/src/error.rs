//! Project error types.
//!
//! Every load and save operation returns a structured error that carries the
//! offending file or configuration name so it can be shown to the user as-is.

use std::path::PathBuf;

use ssis_model::{ModelError, ProtectionLevel};
use thiserror::Error;

/// Broad error categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotLoaded,
    NotFound,
    FormatMismatch,
    UnexpectedEntry,
    ConfigurationNotFound,
    DecryptionFailure,
    MissingPassword,
    Io,
}

/// Project load/save error.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Operation attempted before a load completed.
    #[error("Project is not loaded")]
    NotLoaded,

    /// A required file does not exist.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// A document does not have the expected shape.
    #[error("Invalid {name}: {reason}")]
    InvalidFormat { name: String, reason: String },

    /// Destination does not carry the artifact extension.
    #[error("File {path} must have the .{expected} extension")]
    WrongExtension {
        path: PathBuf,
        expected: &'static str,
    },

    /// Project definition declares a deployment model other than `Project`.
    #[error("Deployment model {found} is not supported")]
    UnsupportedDeploymentModel { found: String },

    /// Archive holds an entry that is not a project file.
    #[error("Unexpected archive entry: {name}")]
    UnexpectedEntry { name: String },

    /// A required archive entry or declared project file is absent.
    #[error("Missing project file: {name}")]
    MissingEntry { name: String },

    /// Named configuration block does not exist.
    #[error("Configuration {name} not found in {path}")]
    ConfigurationNotFound { name: String, path: PathBuf },

    /// Protected payload could not be decrypted.
    #[error("Failed to decrypt {name}: {reason}")]
    DecryptionFailure { name: String, reason: String },

    /// Password-based protection requested without a password.
    #[error("Protection level {level} requires a password")]
    MissingPassword { level: ProtectionLevel },

    /// Protection level or other model value could not be interpreted.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Zip container error.
    #[error("Archive error in {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProjectError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn decryption(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DecryptionFailure {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Attaches a file name to codec errors raised without one.
    pub(crate) fn for_file(self, file_name: &str) -> Self {
        match self {
            Self::InvalidFormat { name, reason } if name.is_empty() => Self::InvalidFormat {
                name: file_name.to_string(),
                reason,
            },
            Self::DecryptionFailure { name, reason } if name.is_empty() => {
                Self::DecryptionFailure {
                    name: file_name.to_string(),
                    reason,
                }
            }
            other => other,
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotLoaded => ErrorKind::NotLoaded,
            Self::FileNotFound { .. } | Self::MissingEntry { .. } => ErrorKind::NotFound,
            Self::InvalidFormat { .. }
            | Self::WrongExtension { .. }
            | Self::UnsupportedDeploymentModel { .. }
            | Self::Model(_) => ErrorKind::FormatMismatch,
            Self::UnexpectedEntry { .. } => ErrorKind::UnexpectedEntry,
            Self::ConfigurationNotFound { .. } => ErrorKind::ConfigurationNotFound,
            Self::DecryptionFailure { .. } => ErrorKind::DecryptionFailure,
            Self::MissingPassword { .. } => ErrorKind::MissingPassword,
            Self::Io { .. } | Self::Archive { .. } | Self::AtomicWriteFailed { .. } => {
                ErrorKind::Io
            }
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotLoaded => "The project must be loaded before it can be changed or saved."
                .to_string(),
            Self::FileNotFound { path } => {
                format!("The file {} could not be found.", path.display())
            }
            Self::InvalidFormat { name, reason } => {
                format!("{name} is not a valid project file: {reason}")
            }
            Self::WrongExtension { path, expected } => {
                format!(
                    "Cannot write {}: the output must be a .{expected} file.",
                    path.display()
                )
            }
            Self::UnsupportedDeploymentModel { found } => {
                format!(
                    "Only projects using the Project deployment model can be built \
                     (found {found})."
                )
            }
            Self::UnexpectedEntry { name } => {
                format!("The archive contains an unexpected file: {name}")
            }
            Self::MissingEntry { name } => format!("The project file {name} is missing."),
            Self::ConfigurationNotFound { name, .. } => {
                format!("The configuration '{name}' does not exist in the project.")
            }
            Self::DecryptionFailure { name, .. } => {
                format!("Could not decrypt {name}. The password may be wrong.")
            }
            Self::MissingPassword { level } => {
                format!("A password is required to save with protection level {level}.")
            }
            Self::Model(error) => error.to_string(),
            Self::Io {
                operation, path, ..
            } => format!("Could not {} the file at {}", operation, path.display()),
            Self::Archive { path, message } => {
                format!("The archive {} could not be processed: {message}", path.display())
            }
            Self::AtomicWriteFailed { target_path, .. } => {
                format!(
                    "Could not save the file to {}. Please check disk space and permissions.",
                    target_path.display()
                )
            }
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::DecryptionFailure { .. } => {
                Some("Check the password passed with --password.".into())
            }
            Self::MissingPassword { .. } => Some(
                "Pass --new-password or choose the DontSaveSensitive protection level.".into(),
            ),
            Self::ConfigurationNotFound { .. } => {
                Some("Check the configuration name passed with --configuration.".into())
            }
            Self::WrongExtension { .. } => Some("Use a path ending in .ispac.".into()),
            Self::UnsupportedDeploymentModel { .. } => {
                Some("Convert the project to the Project deployment model.".into())
            }
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or try saving to a different location.".into())
            }
            _ => None,
        }
    }
}

/// Result type alias for project operations.
pub type Result<T> = std::result::Result<T, ProjectError>;

//! Loading and packaging of SSIS projects.
//!
//! A project exists in two forms: a source layout (a `.dtproj` definition
//! with `Project.params`, connection managers and packages beside it) and a
//! deployable `.ispac` artifact. This crate reads either form into a
//! [`Project`], resolves its parameters and writes an artifact back out.
//!
//! # Parameter resolution
//!
//! Values are layered from lowest to highest precedence:
//!
//! 1. declarations in `Project.params` and the manifest (manifest wins on a
//!    name collision)
//! 2. the named build configuration of the `.dtproj`
//! 3. the per-user `.dtproj.user` overlay, which nulls the values it names
//! 4. manual overrides passed to [`build`]
//!
//! # Protection
//!
//! Every file in an artifact is written under one [`ProtectionLevel`]:
//!
//! - `DontSaveSensitive` drops sensitive values
//! - `EncryptSensitiveWithPassword` encrypts each sensitive value
//! - `EncryptAllWithPassword` encrypts each whole file
//!
//! Keys are derived with PBKDF2-HMAC-SHA256 and data is sealed with
//! AES-256-GCM.
//!
//! # Example
//!
//! ```ignore
//! use ssis_project::{Project, ProtectionLevel};
//!
//! let mut project = Project::new();
//! project.load_from_source_layout(Path::new("Warehouse.dtproj"), "Development", None)?;
//! project.save_with_protection(
//!     Path::new("bin/Warehouse.ispac"),
//!     ProtectionLevel::EncryptSensitiveWithPassword,
//!     Some("secret"),
//! )?;
//! ```

pub mod archive;
mod build;
pub mod codec;
mod error;
pub mod files;
mod hash;
pub mod overlay;
mod project;
pub mod xml;

pub use build::{BuildOptions, BuildReport, DEFAULT_CONFIGURATION, build};
pub use error::{ErrorKind, ProjectError, Result};
pub use hash::compute_file_hash;
pub use overlay::{ConfigurationOverlay, ConfigurationValue, OverlayKind};
pub use project::{Project, default_output_path};

pub use ssis_model::{Parameter, ParameterSource, ParameterTable, ProtectionLevel};

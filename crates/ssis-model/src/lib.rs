//! Model types shared by the SSIS build crates.
//!
//! - [`Parameter`] and [`ParameterSource`] describe a single resolved
//!   parameter and where its value came from.
//! - [`ParameterTable`] is the merged, name-keyed view of every parameter a
//!   project declares.
//! - [`ProtectionLevel`] is the artifact-wide encryption policy.

pub mod error;
pub mod parameter;
pub mod protection;
pub mod table;

pub use error::{ModelError, Result};
pub use parameter::{Parameter, ParameterAssignment, ParameterSource};
pub use protection::ProtectionLevel;
pub use table::ParameterTable;

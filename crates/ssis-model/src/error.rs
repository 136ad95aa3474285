use thiserror::Error;

/// Errors raised while interpreting model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid protection level: {value}")]
    InvalidProtectionLevel { value: String },

    #[error("protection level {level} is not supported for builds")]
    UnsupportedProtectionLevel { level: String },

    #[error("invalid parameter source: {value}")]
    InvalidParameterSource { value: String },

    #[error("invalid parameter assignment '{value}' (expected NAME=VALUE)")]
    InvalidAssignment { value: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;

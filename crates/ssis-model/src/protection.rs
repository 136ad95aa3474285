//! Protection levels for sensitive project data.
//!
//! A protection level decides what part of a project file is encrypted when
//! the project is written and whether a password is needed to read it back.
//! Exactly one level applies to a whole artifact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Protection level applied uniformly to every file of a saved project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProtectionLevel {
    /// Sensitive values are dropped on save.
    #[default]
    DontSaveSensitive,
    /// Only sensitive values are encrypted with a password.
    EncryptSensitiveWithPassword,
    /// The whole payload is encrypted with a password.
    EncryptAllWithPassword,
}

impl ProtectionLevel {
    /// All supported levels, weakest first.
    pub const ALL: [ProtectionLevel; 3] = [
        ProtectionLevel::DontSaveSensitive,
        ProtectionLevel::EncryptSensitiveWithPassword,
        ProtectionLevel::EncryptAllWithPassword,
    ];

    /// Returns the canonical name used in project documents.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProtectionLevel::DontSaveSensitive => "DontSaveSensitive",
            ProtectionLevel::EncryptSensitiveWithPassword => "EncryptSensitiveWithPassword",
            ProtectionLevel::EncryptAllWithPassword => "EncryptAllWithPassword",
        }
    }

    /// Returns the numeric code package and connection documents store.
    pub const fn code(&self) -> u8 {
        match self {
            ProtectionLevel::DontSaveSensitive => 0,
            ProtectionLevel::EncryptSensitiveWithPassword => 2,
            ProtectionLevel::EncryptAllWithPassword => 3,
        }
    }

    /// Parses a numeric protection code.
    pub fn from_code(code: u8) -> Result<Self, ModelError> {
        match code {
            0 => Ok(ProtectionLevel::DontSaveSensitive),
            2 => Ok(ProtectionLevel::EncryptSensitiveWithPassword),
            3 => Ok(ProtectionLevel::EncryptAllWithPassword),
            1 | 4 | 5 => Err(ModelError::UnsupportedProtectionLevel {
                level: code.to_string(),
            }),
            _ => Err(ModelError::InvalidProtectionLevel {
                value: code.to_string(),
            }),
        }
    }

    /// Returns true if saving with this level needs a password.
    pub const fn requires_password(&self) -> bool {
        !matches!(self, ProtectionLevel::DontSaveSensitive)
    }

    /// Returns true if the entire payload is encrypted.
    pub const fn encrypts_all(&self) -> bool {
        matches!(self, ProtectionLevel::EncryptAllWithPassword)
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtectionLevel {
    type Err = ModelError;

    /// Parses a level name (case-insensitive) or its numeric code.
    ///
    /// User-key and server-storage levels are recognised but rejected: they
    /// bind the encryption to a machine account and cannot be reproduced by a
    /// build.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "dontsavesensitive" => Ok(ProtectionLevel::DontSaveSensitive),
            "encryptsensitivewithpassword" => Ok(ProtectionLevel::EncryptSensitiveWithPassword),
            "encryptallwithpassword" => Ok(ProtectionLevel::EncryptAllWithPassword),
            "encryptsensitivewithuserkey" | "encryptallwithuserkey" | "serverstorage" => {
                Err(ModelError::UnsupportedProtectionLevel {
                    level: trimmed.to_string(),
                })
            }
            _ => Err(ModelError::InvalidProtectionLevel {
                value: trimmed.to_string(),
            }),
        }
    }
}

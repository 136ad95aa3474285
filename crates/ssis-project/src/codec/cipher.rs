//! Password-based key derivation and authenticated encryption.
//!
//! Keys are derived with PBKDF2-HMAC-SHA256 from the password and a random
//! salt; values are sealed with AES-256-GCM under a fresh random nonce, so a
//! wrong password surfaces as an authentication failure rather than garbage.

use std::collections::HashMap;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{ProjectError, Result};

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const KDF_ROUNDS: u32 = 600_000;
const KEY_LEN: usize = 32;

/// Version byte leading every sealed value.
pub const BLOB_VERSION: u8 = 1;

/// A key derived from a password and salt.
pub struct PasswordKey {
    salt: [u8; SALT_LEN],
    cipher: Aes256Gcm,
}

impl PasswordKey {
    /// Derives a key under a new random salt.
    pub fn generate(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::derive(password, salt)
    }

    pub fn derive(password: &str, salt: [u8; SALT_LEN]) -> Self {
        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, KDF_ROUNDS, &mut key);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        Self { salt, cipher }
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Encrypts under a fresh nonce, returning `(nonce, ciphertext)`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| ProjectError::invalid("", "encryption failed"))?;
        Ok((nonce, ciphertext))
    }

    pub fn open(&self, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if nonce.len() != NONCE_LEN {
            return Err(ProjectError::decryption("", "invalid nonce length"));
        }
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| ProjectError::decryption("", "wrong password or corrupted data"))
    }

    /// Seals a single value as base64(`version | salt | nonce | ciphertext`).
    pub fn seal_value(&self, plaintext: &str) -> Result<String> {
        let (nonce, ciphertext) = self.seal(plaintext.as_bytes())?;
        let mut blob = Vec::with_capacity(1 + SALT_LEN + NONCE_LEN + ciphertext.len());
        blob.push(BLOB_VERSION);
        blob.extend_from_slice(&self.salt);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(blob))
    }
}

/// Derived keys for one decode pass, cached per salt.
pub struct KeyRing<'a> {
    password: Option<&'a str>,
    keys: HashMap<[u8; SALT_LEN], PasswordKey>,
}

impl<'a> KeyRing<'a> {
    pub fn new(password: Option<&'a str>) -> Self {
        Self {
            password: password.filter(|password| !password.is_empty()),
            keys: HashMap::new(),
        }
    }

    pub fn key(&mut self, salt: [u8; SALT_LEN]) -> Result<&PasswordKey> {
        let password = self.password.ok_or_else(|| {
            ProjectError::decryption("", "payload is protected but no password was supplied")
        })?;
        let key = self
            .keys
            .entry(salt)
            .or_insert_with(|| PasswordKey::derive(password, salt));
        Ok(&*key)
    }

    /// Opens a value produced by [`PasswordKey::seal_value`].
    pub fn open_value(&mut self, sealed: &str) -> Result<String> {
        let blob = decode_base64(sealed.trim())?;
        let header = 1 + SALT_LEN + NONCE_LEN;
        if blob.len() < header || blob[0] != BLOB_VERSION {
            return Err(ProjectError::decryption("", "unrecognised encrypted value"));
        }
        let salt = salt_from(&blob[1..1 + SALT_LEN])?;
        let nonce = &blob[1 + SALT_LEN..header];
        let plaintext = self.key(salt)?.open(nonce, &blob[header..])?;
        String::from_utf8(plaintext)
            .map_err(|_| ProjectError::decryption("", "decrypted value is not UTF-8"))
    }
}

pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| ProjectError::decryption("", format!("invalid base64: {e}")))
}

pub fn salt_from(bytes: &[u8]) -> Result<[u8; SALT_LEN]> {
    bytes
        .try_into()
        .map_err(|_| ProjectError::decryption("", "invalid salt length"))
}

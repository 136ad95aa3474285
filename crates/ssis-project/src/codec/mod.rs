//! Protected payload codec.
//!
//! Turns a parsed payload into bytes under a [`ProtectionLevel`] and back.
//! The protection applied to stored bytes is detected from the bytes
//! themselves:
//!
//! ```text
//! plain           <Root> ... <X Sensitive="1">value</X> ... </Root>
//! sensitive-only  <Root> ... <X Sensitive="1" Encrypted="1">BASE64</X> ... </Root>
//! full            <EncryptedData Salt=".." IV=".."><CipherData>
//!                   <CipherValue>BASE64</CipherValue></CipherData></EncryptedData>
//! ```
//!
//! Sealed sensitive values are `version(1) | salt(16) | nonce(12) | ciphertext`.

mod cipher;

use ssis_model::ProtectionLevel;

use crate::error::{ProjectError, Result};
use crate::xml::{self, XmlElement};

pub use cipher::{KDF_ROUNDS, KeyRing, PasswordKey};

const ENCRYPTED_DATA: &str = "EncryptedData";
const XMLENC_NS: &str = "http://www.w3.org/2001/04/xmlenc#";

/// Protection found on stored bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadProtection {
    Plain,
    SensitiveOnly,
    Full,
}

/// Returns true if the element holds a sensitive value.
pub fn is_sensitive(element: &XmlElement) -> bool {
    element.attribute_local("Sensitive") == Some("1")
}

fn is_encrypted(element: &XmlElement) -> bool {
    element.attribute_local("Encrypted") == Some("1")
}

/// Detects how a parsed payload is protected.
pub fn detect(root: &XmlElement) -> PayloadProtection {
    if root.local_name() == ENCRYPTED_DATA {
        return PayloadProtection::Full;
    }
    let mut encrypted = false;
    root.visit(&mut |element| encrypted |= is_sensitive(element) && is_encrypted(element));
    if encrypted {
        PayloadProtection::SensitiveOnly
    } else {
        PayloadProtection::Plain
    }
}

/// Parses stored bytes and removes whatever protection they carry.
pub fn decode(raw: &[u8], password: Option<&str>) -> Result<XmlElement> {
    let root = xml::parse(raw)?;
    decode_element(root, password)
}

/// Removes protection from an already parsed payload.
pub fn decode_element(root: XmlElement, password: Option<&str>) -> Result<XmlElement> {
    let mut keys = KeyRing::new(password);
    let mut root = match detect(&root) {
        PayloadProtection::Full => {
            let plain = open_envelope(&root, &mut keys)?;
            xml::parse(&plain)?
        }
        PayloadProtection::SensitiveOnly | PayloadProtection::Plain => root,
    };
    open_fields(&mut root, &mut keys)?;
    Ok(root)
}

/// Decrypts every encrypted sensitive value below `root` in place.
pub fn decrypt_fields(root: &mut XmlElement, password: Option<&str>) -> Result<()> {
    open_fields(root, &mut KeyRing::new(password))
}

fn open_fields(root: &mut XmlElement, keys: &mut KeyRing<'_>) -> Result<()> {
    root.try_visit_mut(&mut |element| {
        if is_sensitive(element) && is_encrypted(element) {
            let value = keys.open_value(&element.text())?;
            element.set_text(Some(&value));
            element.attributes.retain(|(key, _)| xml::local_name(key) != "Encrypted");
        }
        Ok(())
    })
}

fn open_envelope(envelope: &XmlElement, keys: &mut KeyRing<'_>) -> Result<Vec<u8>> {
    let salt = envelope
        .attribute_local("Salt")
        .ok_or_else(|| ProjectError::decryption("", "encrypted payload has no salt"))?;
    let nonce = envelope
        .attribute_local("IV")
        .ok_or_else(|| ProjectError::decryption("", "encrypted payload has no IV"))?;
    let value = envelope
        .path(&["CipherData", "CipherValue"])
        .ok_or_else(|| ProjectError::decryption("", "encrypted payload has no cipher value"))?;

    let salt = cipher::salt_from(&cipher::decode_base64(salt)?)?;
    let nonce = cipher::decode_base64(nonce)?;
    let ciphertext = cipher::decode_base64(value.text().trim())?;
    keys.key(salt)?.open(&nonce, &ciphertext)
}

/// Serializes a payload under the given protection level.
///
/// Password levels with no (or an empty) password fail with
/// [`ProjectError::MissingPassword`].
pub fn encode(
    root: &XmlElement,
    level: ProtectionLevel,
    password: Option<&str>,
) -> Result<Vec<u8>> {
    let password = password.filter(|password| !password.is_empty());
    let mut document = root.clone();
    match (level, password) {
        (ProtectionLevel::DontSaveSensitive, _) => {
            strip_fields(&mut document);
            xml::to_bytes(&document)
        }
        (_, None) => Err(ProjectError::MissingPassword { level }),
        (ProtectionLevel::EncryptSensitiveWithPassword, Some(password)) => {
            let key = PasswordKey::generate(password);
            seal_fields(&mut document, &key)?;
            xml::to_bytes(&document)
        }
        (ProtectionLevel::EncryptAllWithPassword, Some(password)) => {
            clear_markers(&mut document);
            let plain = xml::to_bytes(&document)?;
            let key = PasswordKey::generate(password);
            xml::to_bytes(&seal_envelope(&plain, &key)?)
        }
    }
}

fn strip_fields(root: &mut XmlElement) {
    root.visit_mut(&mut |element| {
        if is_sensitive(element) {
            element.set_text(None);
            element.attributes.retain(|(key, _)| xml::local_name(key) != "Encrypted");
        }
    });
}

/// Drops the encryption marker from sensitive elements.
fn clear_markers(root: &mut XmlElement) {
    root.visit_mut(&mut |element| {
        if is_sensitive(element) {
            element.attributes.retain(|(key, _)| xml::local_name(key) != "Encrypted");
        }
    });
}

fn seal_fields(root: &mut XmlElement, key: &PasswordKey) -> Result<()> {
    root.try_visit_mut(&mut |element| {
        if is_sensitive(element) {
            element.attributes.retain(|(name, _)| xml::local_name(name) != "Encrypted");
            if element.has_text() {
                let sealed = key.seal_value(&element.text())?;
                element.set_text(Some(&sealed));
                element.set_attribute("Encrypted", "1");
            }
        }
        Ok(())
    })
}

fn seal_envelope(plain: &[u8], key: &PasswordKey) -> Result<XmlElement> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let (nonce, ciphertext) = key.seal(plain)?;
    Ok(XmlElement::new(ENCRYPTED_DATA)
        .with_attribute("xmlns", XMLENC_NS)
        .with_attribute("Salt", STANDARD.encode(key.salt()))
        .with_attribute("IV", STANDARD.encode(nonce))
        .with_child(
            XmlElement::new("CipherData")
                .with_child(XmlElement::new("CipherValue").with_text(STANDARD.encode(ciphertext))),
        ))
}

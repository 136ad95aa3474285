//! Artifact container layout.
//!
//! An artifact is a zip file with fixed entries for the manifest, the params
//! file and a content-type descriptor, plus one entry per connection manager
//! and package. Entry names are URI part names: each path segment is
//! percent-escaped and the leading separator is dropped.

use std::borrow::Cow;

use crate::error::{ProjectError, Result};

/// Required extension of an artifact.
pub const ARTIFACT_EXTENSION: &str = "ispac";

pub const MANIFEST_ENTRY: &str = "@Project.manifest";
pub const PARAMS_ENTRY: &str = "Project.params";
pub const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";

/// Fixed content of [`CONTENT_TYPES_ENTRY`].
pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="utf-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="dtsx" ContentType="text/xml" /><Default Extension="conmgr" ContentType="text/xml" /><Default Extension="params" ContentType="text/xml" /><Default Extension="manifest" ContentType="text/xml" /></Types>"#;

/// Extensions of entries that describe the container rather than the project.
const METADATA_EXTENSIONS: &[&str] = &["xml"];

/// Returns true if an entry is container metadata and carries no project file.
pub fn is_metadata_entry(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, extension)| {
        METADATA_EXTENSIONS
            .iter()
            .any(|allowed| extension.eq_ignore_ascii_case(allowed))
    })
}

/// Characters allowed unescaped in a URI path segment.
fn is_segment_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:@".contains(ch)
}

fn escape_segment(segment: &str) -> Cow<'_, str> {
    if segment.chars().all(is_segment_char) {
        return Cow::Borrowed(segment);
    }
    let mut escaped = String::with_capacity(segment.len() + 8);
    let mut buf = [0u8; 4];
    for ch in segment.chars() {
        if is_segment_char(ch) {
            escaped.push(ch);
        } else {
            escaped.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    Cow::Owned(escaped)
}

/// Entry name for a project-relative file name.
///
/// `Load Customers.dtsx` becomes `Load%20Customers.dtsx`; backslashes are
/// treated as separators and a leading separator is dropped.
pub fn part_name(logical: &str) -> String {
    let normalized = logical.replace('\\', "/");
    normalized
        .trim_start_matches('/')
        .split('/')
        .map(escape_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Project-relative file name for an entry name.
pub fn logical_name(part: &str) -> Result<String> {
    urlencoding::decode(part.trim_start_matches('/'))
        .map(Cow::into_owned)
        .map_err(|e| ProjectError::UnexpectedEntry {
            name: format!("{part} ({e})"),
        })
}

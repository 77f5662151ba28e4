//! Admin-tools manifest types and pure parsing.
//!
//! The manifest is a JSON object mapping tool ids to acquisition descriptors:
//!
//! ```json
//! { "index": {}, "pma": { "url": "https://…/phpMyAdmin-{version}.zip", "version": "5.2.2" } }
//! ```
//!
//! Key order is preserved so tools always install in the order they are
//! declared.

use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::error::{ManifestError, ToolError};

/// Only JSON manifests are accepted.
pub const MANIFEST_EXTENSION: &str = "json";

/// Placeholder substituted with the entry's `version`.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// One tool declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolManifestEntry {
    /// Manifest key, e.g. `"pma"`.
    pub tool_id: String,
    /// Download URL, possibly containing `{version}`.
    pub url: Option<String>,
    /// Version substituted into `url`.
    pub version: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryFields {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

impl ToolManifestEntry {
    /// Return the download URL with `{version}` substituted.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidDescriptor`] if the entry has no URL, or
    /// the URL has a `{version}` placeholder but the entry has no version.
    pub fn resolved_url(&self) -> Result<String> {
        let url = self.url.as_deref().ok_or_else(|| ToolError::InvalidDescriptor {
            tool: self.tool_id.clone(),
            reason: "missing \"url\"".to_string(),
        })?;
        if !url.contains(VERSION_PLACEHOLDER) {
            return Ok(url.to_string());
        }
        let version = self.version.as_deref().ok_or_else(|| ToolError::InvalidDescriptor {
            tool: self.tool_id.clone(),
            reason: format!("url contains {VERSION_PLACEHOLDER} but no \"version\" is set"),
        })?;
        Ok(url.replace(VERSION_PLACEHOLDER, version))
    }
}

/// Ordered, non-empty collection of manifest entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolManifest {
    entries: Vec<ToolManifestEntry>,
}

impl ToolManifest {
    /// Entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[ToolManifestEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by tool id.
    #[must_use]
    pub fn get(&self, tool_id: &str) -> Option<&ToolManifestEntry> {
        self.entries.iter().find(|e| e.tool_id == tool_id)
    }
}

/// Check that `path` carries the `.json` extension.
///
/// # Errors
///
/// Returns [`ManifestError::Format`] for any other extension.
pub fn check_extension(path: &Path) -> Result<()> {
    let ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(MANIFEST_EXTENSION));
    if !ok {
        return Err(ManifestError::Format {
            path: path.display().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Parse manifest `content`. `source` names the file in error messages.
///
/// # Errors
///
/// - [`ManifestError::Read`] if `content` is blank.
/// - [`ManifestError::Parse`] if it is not a JSON object of objects.
/// - [`ManifestError::Empty`] if the object has no keys.
pub fn parse_manifest(content: &str, source: &str) -> Result<ToolManifest> {
    if content.trim().is_empty() {
        return Err(ManifestError::Read {
            path: source.to_string(),
            reason: "file is empty".to_string(),
        }
        .into());
    }

    let parse_err = |reason: String| ManifestError::Parse {
        path: source.to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(parse_err("top level must be an object".to_string()).into());
    };

    let mut entries = Vec::with_capacity(map.len());
    for (tool_id, raw) in map {
        if !raw.is_object() {
            return Err(parse_err(format!("entry '{tool_id}' must be an object")).into());
        }
        let fields: EntryFields = serde_json::from_value(raw)
            .map_err(|e| parse_err(format!("entry '{tool_id}': {e}")))?;
        entries.push(ToolManifestEntry {
            tool_id,
            url: fields.url,
            version: fields.version,
        });
    }

    if entries.is_empty() {
        return Err(ManifestError::Empty {
            path: source.to_string(),
        }
        .into());
    }
    Ok(ToolManifest { entries })
}

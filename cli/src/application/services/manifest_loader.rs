//! Application service: manifest loading.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::ToolFs;
use crate::domain::ManifestError;
use crate::domain::manifest::{ToolManifest, check_extension, parse_manifest};

/// Read and validate the manifest at `path`.
///
/// # Errors
///
/// Returns a [`ManifestError`] for a wrong extension, an unreadable or blank
/// file, malformed JSON, or an empty mapping.
pub fn load_manifest(fs: &impl ToolFs, path: &Path) -> Result<ToolManifest> {
    check_extension(path)?;
    let source = path.display().to_string();
    let content = fs.read_to_string(path).map_err(|e| ManifestError::Read {
        path: source.clone(),
        reason: format!("{e:#}"),
    })?;
    let manifest = parse_manifest(&content, &source)?;
    tracing::debug!(path = %source, tools = manifest.len(), "loaded admin-tools manifest");
    Ok(manifest)
}

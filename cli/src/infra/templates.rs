//! Embedded templates: the admin-tools pages, configs and compose overlay
//! compiled into the CLI binary.
//!
//! At compile time, `include_dir!` embeds everything under `cli/templates/`:
//!   - `index.php.tpl`: landing page linking every tool
//!   - `phpinfo.php`: static `phpinfo()` page
//!   - `pma-config.inc.php.tpl`: database admin config, takes a secret
//!   - `phpredisadmin-config.inc.php`: static cache admin config
//!   - `docker-compose-admin.yml.tpl`: admin-tools overlay for a site
//!   - `manifest.json`: default tool manifest

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use include_dir::{Dir, include_dir};

use crate::application::ports::TemplateRenderer;

static EMBEDDED_TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Name of the embedded default manifest.
pub const DEFAULT_MANIFEST: &str = "manifest.json";

/// Return the contents of an embedded template.
///
/// # Errors
///
/// Returns an error if no template with the given `name` exists or it is
/// not UTF-8.
pub fn get_template(name: &str) -> Result<&'static str> {
    EMBEDDED_TEMPLATES
        .get_file(name)
        .and_then(|f| f.contents_utf8())
        .ok_or_else(|| anyhow::anyhow!("embedded template not found: {name}"))
}

/// Embedded templates, optionally shadowed by files in an override directory.
pub struct TemplateStore {
    override_dir: Option<PathBuf>,
}

impl TemplateStore {
    #[must_use]
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self { override_dir }
    }
}

impl TemplateRenderer for TemplateStore {
    fn raw(&self, name: &str) -> Result<String> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(name);
            if path.is_file() {
                tracing::debug!(template = %path.display(), "using template override");
                return std::fs::read_to_string(&path)
                    .with_context(|| format!("reading template {}", path.display()));
            }
        }
        get_template(name).map(str::to_string)
    }
}

/// Write the embedded default manifest to `path` unless a file is already there.
///
/// Returns `true` when the manifest was written.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn seed_default_manifest(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, get_template(DEFAULT_MANIFEST)?)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "seeded default admin-tools manifest");
    Ok(true)
}

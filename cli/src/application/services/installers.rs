//! Application service: per-tool installation procedures.
//!
//! The registry is the [`Installer`] enum: one variant per known tool,
//! resolved from a manifest entry before any work starts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{ArchiveExtractor, HttpDownloader, TemplateRenderer, ToolFs};
use crate::application::services::tools_install::AdminTools;
use crate::domain::manifest::ToolManifestEntry;
use crate::domain::tool::{PREDIS_URL, ToolKind, generate_secret};
use crate::domain::ToolError;

pub const INDEX_TEMPLATE: &str = "index.php.tpl";
pub const PHPINFO_TEMPLATE: &str = "phpinfo.php";
pub const PMA_CONFIG_TEMPLATE: &str = "pma-config.inc.php.tpl";
pub const REDIS_CONFIG_TEMPLATE: &str = "phpredisadmin-config.inc.php";

/// Scratch key of the predis library fetched for the cache admin UI.
const PREDIS_SCRATCH: &str = "phpredisadmin-predis";

/// A resolved installation procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Installer {
    Index,
    PhpInfo,
    DatabaseAdmin { url: String },
    CacheAdmin { url: String },
    OpcacheInspector { url: String },
}

impl Installer {
    /// Map a manifest entry to its installer.
    ///
    /// # Errors
    ///
    /// - [`ToolError::UnknownTool`] if no installer handles the tool id.
    /// - [`ToolError::InvalidDescriptor`] if a downloaded tool has no usable URL.
    pub fn resolve(entry: &ToolManifestEntry) -> Result<Self> {
        let kind = ToolKind::from_id(&entry.tool_id)
            .ok_or_else(|| ToolError::UnknownTool(entry.tool_id.clone()))?;
        Ok(match kind {
            ToolKind::Index => Self::Index,
            ToolKind::PhpInfo => Self::PhpInfo,
            ToolKind::DatabaseAdmin => Self::DatabaseAdmin {
                url: entry.resolved_url()?,
            },
            ToolKind::CacheAdmin => Self::CacheAdmin {
                url: entry.resolved_url()?,
            },
            ToolKind::OpcacheInspector => Self::OpcacheInspector {
                url: entry.resolved_url()?,
            },
        })
    }

    #[must_use]
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Index => ToolKind::Index,
            Self::PhpInfo => ToolKind::PhpInfo,
            Self::DatabaseAdmin { .. } => ToolKind::DatabaseAdmin,
            Self::CacheAdmin { .. } => ToolKind::CacheAdmin,
            Self::OpcacheInspector { .. } => ToolKind::OpcacheInspector,
        }
    }

    /// Install into `target` (the tools root joined with the tool id); the
    /// artifact lands at `target` plus the tool's suffix.
    ///
    /// Bundles are configured inside scratch and moved into place last, so a
    /// failed run never leaves an artifact the probe would report as installed.
    ///
    /// # Errors
    ///
    /// Propagates download, extraction, template and filesystem failures.
    pub async fn install<F, H, A, T>(
        &self,
        tools: &AdminTools<'_, F, H, A, T>,
        target: &Path,
    ) -> Result<()>
    where
        F: ToolFs,
        H: HttpDownloader,
        A: ArchiveExtractor,
        T: TemplateRenderer,
    {
        let id = self.kind().id();
        let artifact = suffixed(target, self.kind().artifact_suffix());
        match self {
            Self::Index => {
                let vars = HashMap::from([("url_path", tools.config.url_path.clone())]);
                let page = tools.templates.render(INDEX_TEMPLATE, &vars)?;
                write_page(tools.fs, &artifact, &page)
            }
            Self::PhpInfo => {
                let page = tools.templates.raw(PHPINFO_TEMPLATE)?;
                write_page(tools.fs, &artifact, &page)
            }
            Self::DatabaseAdmin { url } => {
                let pipeline = tools.pipeline();
                let root = pipeline.fetch_root(id, url).await?;
                let vars = HashMap::from([("blowfish_secret", generate_secret())]);
                let config = tools.templates.render(PMA_CONFIG_TEMPLATE, &vars)?;
                tools
                    .fs
                    .write(&root.join("config.inc.php"), &config)
                    .context("writing database admin config")?;
                pipeline.relocate(&root, &artifact)?;
                pipeline.cleanup(id)
            }
            Self::CacheAdmin { url } => {
                let pipeline = tools.pipeline();
                let root = pipeline.fetch_root(id, url).await?;
                let predis = pipeline.fetch_root(PREDIS_SCRATCH, PREDIS_URL).await?;
                pipeline.relocate(&predis, &root.join("vendor").join("predis"))?;
                let config = tools.templates.raw(REDIS_CONFIG_TEMPLATE)?;
                tools
                    .fs
                    .write(&root.join("includes").join("config.inc.php"), &config)
                    .context("writing cache admin config")?;
                pipeline.relocate(&root, &artifact)?;
                pipeline.cleanup(PREDIS_SCRATCH)?;
                pipeline.cleanup(id)
            }
            Self::OpcacheInspector { url } => {
                let pipeline = tools.pipeline();
                let file = pipeline.fetch_file(id, url).await?;
                pipeline.relocate(&file, &artifact)?;
                pipeline.cleanup(id)
            }
        }
    }
}

/// Write a single-file tool next to `artifact` and rename it into place.
fn write_page(fs: &impl ToolFs, artifact: &Path, page: &str) -> Result<()> {
    let partial = suffixed(artifact, ".partial");
    fs.write(&partial, page)?;
    if let Err(e) = fs.rename(&partial, artifact) {
        if let Err(cleanup) = fs.remove_path(&partial) {
            tracing::debug!(
                path = %partial.display(),
                error = %format!("{cleanup:#}"),
                "partial page not removed"
            );
        }
        return Err(e);
    }
    Ok(())
}

/// `target` with `suffix` appended to its final component.
#[must_use]
pub fn suffixed(target: &Path, suffix: &str) -> PathBuf {
    let mut s = target.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

//! Application service: fetch, extract, locate and relocate.
//!
//! The shared acquisition skeleton for tools shipped as archives or remote
//! files. Tool-specific configuration lives in the installers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{ArchiveExtractor, HttpDownloader, ToolFs};
use crate::domain::ToolError;

const ARCHIVE_FILE: &str = "archive";
const EXTRACT_DIR: &str = "extract";
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Per-tool scratch workflow over the download and archive ports.
pub struct FetchPipeline<'a, F, H, A> {
    fs: &'a F,
    http: &'a H,
    archive: &'a A,
    scratch_dir: &'a Path,
    timeout: Duration,
}

impl<'a, F, H, A> FetchPipeline<'a, F, H, A>
where
    F: ToolFs,
    H: HttpDownloader,
    A: ArchiveExtractor,
{
    pub fn new(
        fs: &'a F,
        http: &'a H,
        archive: &'a A,
        scratch_dir: &'a Path,
        timeout: Duration,
    ) -> Self {
        Self {
            fs,
            http,
            archive,
            scratch_dir,
            timeout,
        }
    }

    /// Scratch directory reserved for `tool_id`.
    #[must_use]
    pub fn scratch_for(&self, tool_id: &str) -> PathBuf {
        self.scratch_dir.join(tool_id)
    }

    /// Reset the scratch directory for `tool_id`, dropping stale leftovers.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch directory cannot be recreated.
    pub fn prepare(&self, tool_id: &str) -> Result<PathBuf> {
        let dir = self.scratch_for(tool_id);
        self.fs
            .remove_path(&dir)
            .with_context(|| format!("removing stale scratch {}", dir.display()))?;
        self.fs
            .create_dir_all(&dir)
            .with_context(|| format!("creating scratch {}", dir.display()))?;
        Ok(dir)
    }

    /// Download `url` to `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Network`] on any transfer failure or timeout.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::debug!(%url, dest = %dest.display(), "downloading");
        self.http
            .download(dest, url, self.timeout)
            .await
            .map_err(|e| ToolError::Network {
                url: url.to_string(),
                reason: format!("{e:#}"),
            })?;
        Ok(())
    }

    /// Extract `archive` into `dest_dir` and return its single root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Extraction`] if the archive cannot be unpacked or
    /// does not contain exactly one top-level directory.
    pub async fn extract_root(&self, archive: &Path, dest_dir: &Path) -> Result<PathBuf> {
        self.fs.create_dir_all(dest_dir)?;
        self.archive
            .extract(archive, dest_dir)
            .await
            .map_err(|e| ToolError::Extraction {
                archive: archive.display().to_string(),
                reason: format!("{e:#}"),
            })?;
        let root = self.locate_root(dest_dir).map_err(|e| ToolError::Extraction {
            archive: archive.display().to_string(),
            reason: format!("{e:#}"),
        })?;
        Ok(root)
    }

    /// The single non-hidden directory directly under `dir`.
    ///
    /// Entries starting with `.` and `__MACOSX` are ignored.
    ///
    /// # Errors
    ///
    /// Fails when zero or several candidate directories remain, or when a
    /// loose file sits next to the root.
    pub fn locate_root(&self, dir: &Path) -> Result<PathBuf> {
        let entries = self.fs.list_dir(dir)?;
        let visible: Vec<_> = entries
            .into_iter()
            .filter(|e| !e.name.starts_with('.') && e.name != MACOS_METADATA_DIR)
            .collect();
        match visible.as_slice() {
            [only] if only.is_dir => Ok(dir.join(&only.name)),
            [] => anyhow::bail!("archive is empty"),
            [_] => anyhow::bail!("archive has no top-level directory"),
            many => anyhow::bail!(
                "expected exactly one top-level directory, found {}: {}",
                many.len(),
                many.iter().map(|e| e.name.as_str()).collect::<Vec<_>>().join(", ")
            ),
        }
    }

    /// Move `from` to `to`, replacing any stale partial `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the old target cannot be removed or the move fails.
    pub fn relocate(&self, from: &Path, to: &Path) -> Result<()> {
        self.fs
            .remove_path(to)
            .with_context(|| format!("removing stale {}", to.display()))?;
        if let Some(parent) = to.parent() {
            self.fs.create_dir_all(parent)?;
        }
        self.fs
            .rename(from, to)
            .with_context(|| format!("moving {} to {}", from.display(), to.display()))
    }

    /// Download and unpack `url` for `tool_id`, returning the extracted root.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Network`] or [`ToolError::Extraction`] from the
    /// respective step, or an I/O error from scratch preparation.
    pub async fn fetch_root(&self, tool_id: &str, url: &str) -> Result<PathBuf> {
        let scratch = self.prepare(tool_id)?;
        let archive = scratch.join(ARCHIVE_FILE);
        self.download(url, &archive).await?;
        self.extract_root(&archive, &scratch.join(EXTRACT_DIR)).await
    }

    /// Download a single file for `tool_id` into scratch and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Network`] on transfer failure.
    pub async fn fetch_file(&self, tool_id: &str, url: &str) -> Result<PathBuf> {
        let scratch = self.prepare(tool_id)?;
        let file = scratch.join(tool_id);
        self.download(url, &file).await?;
        Ok(file)
    }

    /// Drop the scratch directory of `tool_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub fn cleanup(&self, tool_id: &str) -> Result<()> {
        self.fs.remove_path(&self.scratch_for(tool_id))
    }
}

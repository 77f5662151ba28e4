//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{SiteRecord, SiteboxConfig};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with the runner's default timeout and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Config Store Port ─────────────────────────────────────────────────────────

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, returning defaults when no file exists.
    fn load(&self) -> Result<SiteboxConfig>;
    /// Path of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
}

/// File-system primitives used by the installers.
pub trait ToolFs {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// Remove a file or directory tree. Missing paths are not an error.
    fn remove_path(&self, path: &Path) -> Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    /// Write `content`, creating parent directories as needed.
    fn write(&self, path: &Path, content: &str) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// List the immediate children of `path`, sorted by name.
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntryInfo>>;
}

// ── Acquisition Ports ─────────────────────────────────────────────────────────

/// Downloads a URL to a local file.
#[allow(async_fn_in_trait)]
pub trait HttpDownloader {
    /// Download `url` into `dest`, failing if it takes longer than `timeout`.
    async fn download(&self, dest: &Path, url: &str, timeout: Duration) -> Result<()>;
}

/// Unpacks an archive into a directory.
#[allow(async_fn_in_trait)]
pub trait ArchiveExtractor {
    /// Extract `archive` into `dest_dir`. Fails when the archive is corrupt
    /// or not a supported format.
    async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()>;
}

/// Resolves named templates.
pub trait TemplateRenderer {
    /// Template contents, verbatim.
    fn raw(&self, name: &str) -> Result<String>;
    /// Template contents with `{{var}}` placeholders substituted.
    fn render(&self, name: &str, vars: &HashMap<&str, String>) -> Result<String> {
        Ok(crate::domain::template::render(&self.raw(name)?, vars))
    }
}

// ── Container Runtime Port ────────────────────────────────────────────────────

/// Container composition operations scoped to a site working directory.
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// List services declared by the site's base composition.
    async fn compose_services(&self, working_dir: &Path) -> Result<Vec<String>>;
    /// (Re)start `services` using the given composition `files` in `working_dir`.
    async fn compose_up(&self, working_dir: &Path, files: &[&str], services: &[&str])
        -> Result<()>;
    /// Whether the running `service` container has a mount at `container_path`.
    async fn mount_active(
        &self,
        working_dir: &Path,
        service: &str,
        container_path: &str,
    ) -> Result<bool>;
}

// ── Site Registry Port ────────────────────────────────────────────────────────

/// Abstracts site record persistence.
#[allow(async_fn_in_trait)]
pub trait SiteRegistry {
    /// Look up a site by name, returning `None` if it is not registered.
    async fn find(&self, name: &str) -> Result<Option<SiteRecord>>;
    /// Find the site whose root contains `path`.
    async fn find_by_path(&self, path: &Path) -> Result<Option<SiteRecord>>;
    /// Persist the given record.
    async fn save(&self, site: &SiteRecord) -> Result<()>;
}

// ── Locking Port ──────────────────────────────────────────────────────────────

/// Advisory locks serializing work across processes. Dropping a guard
/// releases its lock.
pub trait LockProvider {
    type Guard;
    /// Exclusive lock over the shared tools root.
    fn lock_install(&self) -> Result<Self::Guard>;
    /// Exclusive lock over one site's toggle.
    fn lock_site(&self, site: &str) -> Result<Self::Guard>;
}

//! Infrastructure implementation of the `LockProvider` port over `fslock`.

use std::path::Path;

use anyhow::{Context, Result};
use fslock::LockFile;

use crate::application::ports::LockProvider;
use crate::domain::ToolsConfig;

/// Holds an exclusive advisory file lock until dropped.
pub struct LockGuard {
    lock: LockFile,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = self.lock.unlock();
    }
}

fn acquire(path: &Path) -> Result<LockGuard> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating lock directory {}", parent.display()))?;
    }
    let mut lock =
        LockFile::open(path).with_context(|| format!("opening lock {}", path.display()))?;
    if !lock
        .try_lock()
        .with_context(|| format!("locking {}", path.display()))?
    {
        tracing::info!(lock = %path.display(), "waiting for another sitebox process");
        lock.lock()
            .with_context(|| format!("locking {}", path.display()))?;
    }
    Ok(LockGuard { lock })
}

/// Lock files laid out by [`ToolsConfig`].
pub struct FsLocks<'a> {
    config: &'a ToolsConfig,
}

impl<'a> FsLocks<'a> {
    #[must_use]
    pub fn new(config: &'a ToolsConfig) -> Self {
        Self { config }
    }
}

impl LockProvider for FsLocks<'_> {
    type Guard = LockGuard;

    fn lock_install(&self) -> Result<LockGuard> {
        acquire(&self.config.install_lock_path())
    }

    fn lock_site(&self, site: &str) -> Result<LockGuard> {
        acquire(&self.config.site_lock_path(site))
    }
}

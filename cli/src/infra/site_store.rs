//! Infrastructure implementation of the `SiteRegistry` port.
//!
//! `JsonSiteRegistry` keeps one `<site>.json` per site under the sites
//! directory. Writes go through a temp file and a rename so a crash never
//! leaves a half-written record.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::SiteRegistry;
use crate::domain::SiteRecord;
use crate::domain::site::validate_site_name;

/// Directory of site records implementing `SiteRegistry` for the infra layer.
pub struct JsonSiteRegistry {
    dir: PathBuf,
}

impl JsonSiteRegistry {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn record_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.json"))
    }

    fn load_sync(dir: &Path, name: &str) -> Result<Option<SiteRecord>> {
        validate_site_name(name)?;
        let path = Self::record_path(dir, name);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading site record {}", path.display()))?;
        let record: SiteRecord = serde_json::from_str(&content)
            .with_context(|| format!("parsing site record {}", path.display()))?;
        Ok(Some(record))
    }

    fn find_by_path_sync(dir: &Path, path: &Path) -> Result<Option<SiteRecord>> {
        if !dir.is_dir() {
            return Ok(None);
        }
        let needle = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut best: Option<(usize, SiteRecord)> = None;
        for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
            let entry_path = entry?.path();
            if entry_path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&entry_path)
                .with_context(|| format!("reading site record {}", entry_path.display()))?;
            let record: SiteRecord = match serde_json::from_str(&content) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(
                        path = %entry_path.display(),
                        error = %e,
                        "skipping unreadable site record"
                    );
                    continue;
                }
            };
            let root = std::fs::canonicalize(&record.root).unwrap_or_else(|_| record.root.clone());
            if !needle.starts_with(&root) {
                continue;
            }
            let depth = root.components().count();
            if best.as_ref().is_none_or(|(d, _)| depth > *d) {
                best = Some((depth, record));
            }
        }
        Ok(best.map(|(_, r)| r))
    }

    fn save_sync(dir: &Path, record: &SiteRecord) -> Result<()> {
        validate_site_name(&record.name)?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
        let path = Self::record_path(dir, &record.name);
        let content = serde_json::to_string_pretty(record).context("serializing site record")?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("finalizing site record {}", path.display()))
    }
}

impl SiteRegistry for JsonSiteRegistry {
    async fn find(&self, name: &str) -> Result<Option<SiteRecord>> {
        let dir = self.dir.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || Self::load_sync(&dir, &name))
            .await
            .context("site load task panicked")?
    }

    async fn find_by_path(&self, path: &Path) -> Result<Option<SiteRecord>> {
        let dir = self.dir.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::find_by_path_sync(&dir, &path))
            .await
            .context("site lookup task panicked")?
    }

    async fn save(&self, site: &SiteRecord) -> Result<()> {
        let dir = self.dir.clone();
        let record = site.clone();
        tokio::task::spawn_blocking(move || Self::save_sync(&dir, &record))
            .await
            .context("site save task panicked")?
    }
}

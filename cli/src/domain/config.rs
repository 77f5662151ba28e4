//! Configuration schema and path resolution for sitebox.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_URL_PATH: &str = "/admin-tools";
pub const DEFAULT_MOUNT_PATH: &str = "/var/www/htdocs/admin-tools";
pub const DEFAULT_WEB_SERVICE: &str = "nginx";
pub const DEFAULT_RUNTIME_SERVICE: &str = "php";
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_COMPOSE_TIMEOUT_SECS: u64 = 300;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.sitebox/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SiteboxConfig {
    /// Admin-tools installation settings.
    pub admin_tools: AdminToolsSettings,
    /// Container composition settings.
    pub compose: ComposeSettings,
    /// Directory holding one `<site>.json` record per site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites_dir: Option<PathBuf>,
}

/// `admin_tools:` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdminToolsSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    /// Directory whose files override the embedded templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
    /// URL prefix the tools are served under.
    pub url_path: String,
    /// Container path the tools root is mounted at.
    pub mount_path: String,
    pub download_timeout_secs: u64,
}

impl Default for AdminToolsSettings {
    fn default() -> Self {
        Self {
            tools_root: None,
            manifest: None,
            scratch_dir: None,
            templates_dir: None,
            url_path: DEFAULT_URL_PATH.to_string(),
            mount_path: DEFAULT_MOUNT_PATH.to_string(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

/// `compose:` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ComposeSettings {
    pub web_service: String,
    pub runtime_service: String,
    pub timeout_secs: u64,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            web_service: DEFAULT_WEB_SERVICE.to_string(),
            runtime_service: DEFAULT_RUNTIME_SERVICE.to_string(),
            timeout_secs: DEFAULT_COMPOSE_TIMEOUT_SECS,
        }
    }
}

// ── Resolved configuration ───────────────────────────────────────────────────

/// Fully resolved paths and limits handed to the admin-tools services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsConfig {
    pub tools_root: PathBuf,
    pub manifest_path: PathBuf,
    pub scratch_dir: PathBuf,
    pub templates_dir: Option<PathBuf>,
    pub sites_dir: PathBuf,
    pub state_dir: PathBuf,
    pub url_path: String,
    pub mount_path: String,
    pub web_service: String,
    pub runtime_service: String,
    pub download_timeout: Duration,
    pub compose_timeout: Duration,
}

impl SiteboxConfig {
    /// Resolve unset paths relative to `base_dir` (normally `~/.sitebox`).
    #[must_use]
    pub fn resolve(&self, base_dir: &Path) -> ToolsConfig {
        let tools = &self.admin_tools;
        let tools_root = tools
            .tools_root
            .clone()
            .unwrap_or_else(|| base_dir.join("admin-tools"));
        ToolsConfig {
            manifest_path: tools
                .manifest
                .clone()
                .unwrap_or_else(|| base_dir.join("admin-tools.json")),
            scratch_dir: tools
                .scratch_dir
                .clone()
                .unwrap_or_else(|| base_dir.join("tmp")),
            templates_dir: tools.templates_dir.clone(),
            sites_dir: self
                .sites_dir
                .clone()
                .unwrap_or_else(|| base_dir.join("sites")),
            state_dir: base_dir.to_path_buf(),
            url_path: tools.url_path.trim_end_matches('/').to_string(),
            mount_path: tools.mount_path.clone(),
            web_service: self.compose.web_service.clone(),
            runtime_service: self.compose.runtime_service.clone(),
            download_timeout: Duration::from_secs(tools.download_timeout_secs),
            compose_timeout: Duration::from_secs(self.compose.timeout_secs),
            tools_root,
        }
    }
}

impl ToolsConfig {
    /// Lock file serializing tool installation across processes.
    #[must_use]
    pub fn install_lock_path(&self) -> PathBuf {
        let mut s = self.tools_root.as_os_str().to_owned();
        s.push(".lock");
        PathBuf::from(s)
    }

    /// Lock file serializing enable/disable for one site.
    #[must_use]
    pub fn site_lock_path(&self, site: &str) -> PathBuf {
        self.state_dir.join("locks").join(format!("site-{site}.lock"))
    }
}

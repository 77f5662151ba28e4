//! Site record and admin-tools toggle rules.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! All functions take data in and return data out.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::config::ToolsConfig;
use crate::domain::error::SiteError;

/// Base composition document every site carries.
pub const BASE_COMPOSE_FILE: &str = "docker-compose.yml";

/// Admin-tools overlay rendered on `enable`.
pub const OVERLAY_COMPOSE_FILE: &str = "docker-compose-admin.yml";

static SITE_NAME_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([a-z0-9.-]{0,251}[a-z0-9])?$"));

/// A managed site as stored by the site registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteRecord {
    /// Site name, e.g. `"example.test"`.
    pub name: String,
    /// Site working directory holding the composition documents.
    pub root: PathBuf,
    /// Whether the site itself is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Admin-tools flag: true iff the overlay is applied.
    #[serde(default)]
    pub admin_tools: bool,
    /// Host directory of the database socket, mounted for the database admin UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

/// Persisted admin-tools state of a site.
///
/// An in-flight enable/disable holds the site lock; that transient state is
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminToolsState {
    Disabled,
    Enabled,
}

impl AdminToolsState {
    #[must_use]
    pub fn from_flag(flag: bool) -> Self {
        if flag { Self::Enabled } else { Self::Disabled }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Enabled => "enabled",
        }
    }
}

impl SiteRecord {
    #[must_use]
    pub fn admin_tools_state(&self) -> AdminToolsState {
        AdminToolsState::from_flag(self.admin_tools)
    }

    /// Database socket directory, defaulting to `<root>/services/db/run`.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.root.join("services").join("db").join("run"))
    }
}

/// Validate a site name before it is used in file paths.
///
/// # Errors
///
/// Returns [`SiteError::InvalidName`] if the name is not a lowercase
/// domain-like label sequence.
pub fn validate_site_name(name: &str) -> Result<()> {
    let valid = SITE_NAME_RE
        .as_ref()
        .map_err(|e| anyhow::anyhow!("site name pattern: {e}"))?
        .is_match(name);
    if !valid || name.contains("..") {
        return Err(SiteError::InvalidName(name.to_string()).into());
    }
    Ok(())
}

/// Check that the base composition declares the web and runtime services.
///
/// # Errors
///
/// Returns [`SiteError::UnsupportedSiteType`] naming the first missing service.
pub fn check_required_services(
    site: &str,
    services: &[String],
    config: &ToolsConfig,
) -> Result<()> {
    for required in [&config.web_service, &config.runtime_service] {
        if !services.iter().any(|s| s == required) {
            return Err(SiteError::UnsupportedSiteType {
                site: site.to_string(),
                missing: required.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// Decide whether a toggle towards `target` may proceed.
///
/// # Errors
///
/// Returns [`SiteError::AlreadyEnabled`] / [`SiteError::AlreadyDisabled`]
/// when the site is already in `target` and `force` is not set.
pub fn check_transition(site: &SiteRecord, target: AdminToolsState, force: bool) -> Result<()> {
    if force || site.admin_tools_state() != target {
        return Ok(());
    }
    Err(match target {
        AdminToolsState::Enabled => SiteError::AlreadyEnabled(site.name.clone()),
        AdminToolsState::Disabled => SiteError::AlreadyDisabled(site.name.clone()),
    }
    .into())
}

/// Template variables for the admin-tools composition overlay.
#[must_use]
pub fn overlay_vars(site: &SiteRecord, config: &ToolsConfig) -> HashMap<&'static str, String> {
    HashMap::from([
        ("site_name", site.name.clone()),
        ("site_root", site.root.display().to_string()),
        ("db_path", site.db_path().display().to_string()),
        ("tools_root", config.tools_root.display().to_string()),
        ("mount_path", config.mount_path.clone()),
        ("web_service", config.web_service.clone()),
        ("runtime_service", config.runtime_service.clone()),
    ])
}

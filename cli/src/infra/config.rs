//! Infrastructure implementation of the `ConfigStore` port.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::SiteboxConfig;

/// Overrides the state directory (`~/.sitebox`).
pub const HOME_ENV: &str = "SITEBOX_HOME";
/// Overrides the configuration file path.
pub const CONFIG_ENV: &str = "SITEBOX_CONFIG";

/// State directory holding config, records, locks and the tools root.
///
/// # Errors
///
/// Returns an error if `SITEBOX_HOME` is unset and the home directory cannot
/// be determined.
pub fn sitebox_home() -> Result<PathBuf> {
    if let Ok(val) = std::env::var(HOME_ENV) {
        return Ok(PathBuf::from(val));
    }
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(".sitebox"))
}

/// Production implementation of `ConfigStore` that uses a YAML file on disk.
pub struct YamlConfigStore;

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<SiteboxConfig> {
        let path = self.path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(SiteboxConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn path(&self) -> Result<PathBuf> {
        if let Ok(val) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(val));
        }
        Ok(sitebox_home()?.join("config.yaml"))
    }
}

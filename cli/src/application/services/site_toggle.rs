//! Application service: site admin-tools enable/disable.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! The flag on the site record is only written after the container runtime
//! accepted the new composition. A failed save at that point surfaces as
//! [`SiteError::PersistAfterApply`]; the next call heals it through
//! [`reconcile`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{
    ArchiveExtractor, ContainerRuntime, HttpDownloader, LockProvider, ProgressReporter,
    SiteRegistry, TemplateRenderer, ToolFs,
};
use crate::application::services::probe::InstallProbe;
use crate::application::services::tools_install::{AdminTools, InstallReport, install_tools};
use crate::domain::site::{
    BASE_COMPOSE_FILE, OVERLAY_COMPOSE_FILE, check_required_services, check_transition,
    overlay_vars, validate_site_name,
};
use crate::domain::{AdminToolsState, SiteError, SiteRecord, ToolKind, ToolsConfig};

pub const OVERLAY_TEMPLATE: &str = "docker-compose-admin.yml.tpl";

/// Which site to act on and how.
#[derive(Debug, Clone, Copy)]
pub struct ToggleOptions<'a> {
    /// Site name; resolved from `cwd` when `None`.
    pub site: Option<&'a str>,
    pub cwd: &'a Path,
    /// Skip the already-in-state check.
    pub force: bool,
}

/// Result of comparing the stored flag with the running containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Reconciliation {
    /// Flag matches the web service mounts.
    Consistent,
    /// Flag disagreed and was rewritten.
    Corrected {
        from: AdminToolsState,
        to: AdminToolsState,
    },
    /// The runtime could not be probed; the stored flag is trusted.
    Unknown { reason: String },
}

/// Outcome of [`enable_site`] / [`disable_site`].
#[derive(Debug, Serialize)]
pub struct ToggleOutcome {
    pub site: String,
    pub state: AdminToolsState,
    pub reconciliation: Reconciliation,
    /// Present for `enable` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallReport>,
}

/// Whether one known tool is present under the tools root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolPresence {
    pub tool: String,
    pub installed: bool,
}

/// Snapshot returned by [`site_status`].
#[derive(Debug, Serialize)]
pub struct SiteStatus {
    pub site: String,
    pub root: PathBuf,
    pub state: AdminToolsState,
    pub reconciliation: Reconciliation,
    pub overlay_present: bool,
    pub tools: Vec<ToolPresence>,
}

/// Look up the target site by name or by the directory it contains.
///
/// # Errors
///
/// Returns [`SiteError::InvalidName`] for a malformed name and
/// [`SiteError::NotFound`] if the site is unknown or itself disabled.
pub async fn resolve_site(
    registry: &impl SiteRegistry,
    site: Option<&str>,
    cwd: &Path,
) -> Result<SiteRecord> {
    let (record, label) = match site {
        Some(name) => {
            validate_site_name(name)?;
            (registry.find(name).await?, name.to_string())
        }
        None => (
            registry.find_by_path(cwd).await?,
            cwd.display().to_string(),
        ),
    };
    match record {
        Some(r) if r.enabled => {
            validate_site_name(&r.name)?;
            Ok(r)
        }
        Some(r) => Err(SiteError::NotFound(r.name).into()),
        None => Err(SiteError::NotFound(label).into()),
    }
}

/// Align the stored flag with whether the web service has the tools mounted.
///
/// # Errors
///
/// Returns an error only if a corrected record cannot be saved.
pub async fn reconcile(
    runtime: &impl ContainerRuntime,
    registry: &impl SiteRegistry,
    site: &mut SiteRecord,
    config: &ToolsConfig,
) -> Result<Reconciliation> {
    let active = match runtime
        .mount_active(&site.root, &config.web_service, &config.mount_path)
        .await
    {
        Ok(active) => active,
        Err(e) => {
            tracing::debug!(site = %site.name, error = %format!("{e:#}"), "mount probe failed");
            return Ok(Reconciliation::Unknown {
                reason: format!("{e:#}"),
            });
        }
    };
    if active == site.admin_tools {
        return Ok(Reconciliation::Consistent);
    }
    let from = site.admin_tools_state();
    site.admin_tools = active;
    registry
        .save(site)
        .await
        .with_context(|| format!("saving reconciled record for '{}'", site.name))?;
    let to = site.admin_tools_state();
    tracing::warn!(
        site = %site.name,
        from = from.as_str(),
        to = to.as_str(),
        "corrected admin-tools flag"
    );
    Ok(Reconciliation::Corrected { from, to })
}

/// Turn admin tools on for a site.
///
/// Installs missing tools, writes the overlay, restarts the web service with
/// it and then records the new state.
///
/// # Errors
///
/// Returns a [`SiteError`] for site-level failures, or any error raised by
/// [`install_tools`].
pub async fn enable_site<F, H, A, T>(
    tools: &AdminTools<'_, F, H, A, T>,
    runtime: &impl ContainerRuntime,
    registry: &impl SiteRegistry,
    locks: &impl LockProvider,
    reporter: &impl ProgressReporter,
    opts: ToggleOptions<'_>,
) -> Result<ToggleOutcome>
where
    F: ToolFs,
    H: HttpDownloader,
    A: ArchiveExtractor,
    T: TemplateRenderer,
{
    let config = tools.config;
    let name = resolve_site(registry, opts.site, opts.cwd).await?.name;
    let _guard = locks
        .lock_site(&name)
        .with_context(|| format!("acquiring lock for site '{name}'"))?;
    let mut site = resolve_site(registry, Some(&name), opts.cwd).await?;

    ensure_supported(runtime, &site, config).await?;
    let reconciliation = reconcile(runtime, registry, &mut site, config).await?;
    check_transition(&site, AdminToolsState::Enabled, opts.force)?;

    reporter.step("checking admin tools...");
    let install = install_tools(tools, locks, reporter).await?;

    let was_enabled = site.admin_tools;
    let overlay_path = site.root.join(OVERLAY_COMPOSE_FILE);
    let overlay = tools
        .templates
        .render(OVERLAY_TEMPLATE, &overlay_vars(&site, config))?;
    tools
        .fs
        .write(&overlay_path, &overlay)
        .with_context(|| format!("writing {}", overlay_path.display()))?;

    reporter.step(&format!("restarting {} with admin tools...", config.web_service));
    if let Err(e) = runtime
        .compose_up(
            &site.root,
            &[BASE_COMPOSE_FILE, OVERLAY_COMPOSE_FILE],
            &[config.web_service.as_str()],
        )
        .await
    {
        if !was_enabled && let Err(cleanup) = tools.fs.remove_path(&overlay_path) {
            tracing::warn!(
                path = %overlay_path.display(),
                error = %format!("{cleanup:#}"),
                "overlay not removed"
            );
            reporter.warn(&format!(
                "could not remove {}: {cleanup:#}",
                overlay_path.display()
            ));
        }
        return Err(SiteError::ComposeApply {
            site: site.name,
            reason: format!("{e:#}"),
        }
        .into());
    }

    site.admin_tools = true;
    persist_after_apply(registry, &site).await?;
    tracing::info!(site = %site.name, "admin tools enabled");
    Ok(ToggleOutcome {
        site: site.name,
        state: AdminToolsState::Enabled,
        reconciliation,
        install: Some(install),
    })
}

/// Turn admin tools off for a site by restarting its base services.
///
/// # Errors
///
/// Returns a [`SiteError`] for any site-level failure.
pub async fn disable_site(
    fs: &impl ToolFs,
    config: &ToolsConfig,
    runtime: &impl ContainerRuntime,
    registry: &impl SiteRegistry,
    locks: &impl LockProvider,
    reporter: &impl ProgressReporter,
    opts: ToggleOptions<'_>,
) -> Result<ToggleOutcome> {
    let name = resolve_site(registry, opts.site, opts.cwd).await?.name;
    let _guard = locks
        .lock_site(&name)
        .with_context(|| format!("acquiring lock for site '{name}'"))?;
    let mut site = resolve_site(registry, Some(&name), opts.cwd).await?;

    ensure_supported(runtime, &site, config).await?;
    let reconciliation = reconcile(runtime, registry, &mut site, config).await?;
    check_transition(&site, AdminToolsState::Disabled, opts.force)?;

    reporter.step(&format!(
        "restarting {} and {} without admin tools...",
        config.web_service, config.runtime_service
    ));
    runtime
        .compose_up(
            &site.root,
            &[BASE_COMPOSE_FILE],
            &[config.web_service.as_str(), config.runtime_service.as_str()],
        )
        .await
        .map_err(|e| SiteError::ComposeApply {
            site: site.name.clone(),
            reason: format!("{e:#}"),
        })?;

    let overlay_path = site.root.join(OVERLAY_COMPOSE_FILE);
    if let Err(e) = fs.remove_path(&overlay_path) {
        reporter.warn(&format!("could not remove {}: {e:#}", overlay_path.display()));
    }

    site.admin_tools = false;
    persist_after_apply(registry, &site).await?;
    tracing::info!(site = %site.name, "admin tools disabled");
    Ok(ToggleOutcome {
        site: site.name,
        state: AdminToolsState::Disabled,
        reconciliation,
        install: None,
    })
}

/// Reconcile and report the admin-tools state of a site.
///
/// # Errors
///
/// Returns [`SiteError::NotFound`] if the site cannot be resolved.
pub async fn site_status(
    fs: &impl ToolFs,
    config: &ToolsConfig,
    runtime: &impl ContainerRuntime,
    registry: &impl SiteRegistry,
    locks: &impl LockProvider,
    opts: ToggleOptions<'_>,
) -> Result<SiteStatus> {
    let name = resolve_site(registry, opts.site, opts.cwd).await?.name;
    let _guard = locks
        .lock_site(&name)
        .with_context(|| format!("acquiring lock for site '{name}'"))?;
    let mut site = resolve_site(registry, Some(&name), opts.cwd).await?;
    let reconciliation = reconcile(runtime, registry, &mut site, config).await?;

    let probe = InstallProbe::new(fs, &config.tools_root);
    let tools = ToolKind::ALL
        .iter()
        .map(|k| ToolPresence {
            tool: k.id().to_string(),
            installed: probe.is_installed(Some(k.id())),
        })
        .collect();
    Ok(SiteStatus {
        overlay_present: fs.exists(&site.root.join(OVERLAY_COMPOSE_FILE)),
        state: site.admin_tools_state(),
        site: site.name,
        root: site.root,
        reconciliation,
        tools,
    })
}

async fn ensure_supported(
    runtime: &impl ContainerRuntime,
    site: &SiteRecord,
    config: &ToolsConfig,
) -> Result<()> {
    let services = runtime
        .compose_services(&site.root)
        .await
        .map_err(|e| SiteError::ComposeApply {
            site: site.name.clone(),
            reason: format!("listing services: {e:#}"),
        })?;
    check_required_services(&site.name, &services, config)
}

async fn persist_after_apply(registry: &impl SiteRegistry, site: &SiteRecord) -> Result<()> {
    registry.save(site).await.map_err(|e| {
        tracing::error!(
            site = %site.name,
            error = %format!("{e:#}"),
            "flag not persisted after compose apply"
        );
        anyhow::Error::from(SiteError::PersistAfterApply {
            site: site.name.clone(),
            reason: format!("{e:#}"),
        })
    })
}

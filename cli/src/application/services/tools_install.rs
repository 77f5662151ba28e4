//! Application service: admin-tools installation use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{
    ArchiveExtractor, HttpDownloader, LockProvider, ProgressReporter, TemplateRenderer, ToolFs,
};
use crate::application::services::installers::Installer;
use crate::application::services::manifest_loader::load_manifest;
use crate::application::services::pipeline::FetchPipeline;
use crate::application::services::probe::InstallProbe;
use crate::domain::ToolsConfig;

/// Ports and configuration shared by every installer.
pub struct AdminTools<'a, F, H, A, T> {
    pub fs: &'a F,
    pub http: &'a H,
    pub archive: &'a A,
    pub templates: &'a T,
    pub config: &'a ToolsConfig,
}

impl<'a, F, H, A, T> AdminTools<'a, F, H, A, T>
where
    F: ToolFs,
    H: HttpDownloader,
    A: ArchiveExtractor,
    T: TemplateRenderer,
{
    #[must_use]
    pub fn pipeline(&self) -> FetchPipeline<'a, F, H, A> {
        FetchPipeline::new(
            self.fs,
            self.http,
            self.archive,
            &self.config.scratch_dir,
            self.config.download_timeout,
        )
    }

    #[must_use]
    pub fn probe(&self) -> InstallProbe<'a, F> {
        InstallProbe::new(self.fs, &self.config.tools_root)
    }
}

/// Outcome of [`install_tools`], tool ids in manifest order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Install every manifest tool missing from the tools root.
///
/// Idempotent: tools already present are skipped without any network
/// access. The first failure aborts the run; tools installed before it stay
/// on disk for the next attempt.
///
/// # Errors
///
/// Returns the manifest, registry or installer error that stopped the run.
pub async fn install_tools<F, H, A, T>(
    tools: &AdminTools<'_, F, H, A, T>,
    locks: &impl LockProvider,
    reporter: &impl ProgressReporter,
) -> Result<InstallReport>
where
    F: ToolFs,
    H: HttpDownloader,
    A: ArchiveExtractor,
    T: TemplateRenderer,
{
    let _guard = locks.lock_install().context("acquiring admin-tools install lock")?;

    let root = &tools.config.tools_root;
    let probe = tools.probe();
    if !probe.is_installed(None) {
        tools
            .fs
            .create_dir_all(root)
            .with_context(|| format!("creating tools root {}", root.display()))?;
    }

    let manifest = load_manifest(tools.fs, &tools.config.manifest_path)?;
    let plan = manifest
        .entries()
        .iter()
        .map(|entry| Installer::resolve(entry).map(|i| (entry.tool_id.as_str(), i)))
        .collect::<Result<Vec<_>>>()?;

    let mut report = InstallReport::default();
    for (tool_id, installer) in plan {
        if probe.is_installed(Some(tool_id)) {
            tracing::debug!(tool = tool_id, "already installed");
            report.skipped.push(tool_id.to_string());
            continue;
        }
        reporter.step(&format!("installing {tool_id}..."));
        installer
            .install(tools, &root.join(tool_id))
            .await
            .with_context(|| format!("installing admin tool '{tool_id}'"))?;
        reporter.success(&format!("installed {tool_id}"));
        tracing::info!(tool = tool_id, "installed admin tool");
        report.installed.push(tool_id.to_string());
    }
    Ok(report)
}

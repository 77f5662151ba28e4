//! Application context: unified state passed to every command handler.
//!
//! `AppContext` owns the resolved configuration and one production adapter
//! per port. Command handlers borrow from it instead of wiring adapters
//! themselves.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::application::services::tools_install::AdminTools;
use crate::domain::ToolsConfig;
use crate::infra::archive::LocalArchiveExtractor;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::compose::DockerCompose;
use crate::infra::config::{YamlConfigStore, sitebox_home};
use crate::infra::download::UreqDownloader;
use crate::infra::fs::LocalToolFs;
use crate::infra::lock::FsLocks;
use crate::infra::site_store::JsonSiteRegistry;
use crate::infra::templates::TemplateStore;
use crate::output::{HumanRenderer, OutputContext, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Resolved paths, service names and timeouts.
    pub config: ToolsConfig,
    pub fs: LocalToolFs,
    pub http: UreqDownloader,
    pub archive: LocalArchiveExtractor,
    pub templates: TemplateStore,
    pub runtime: DockerCompose<TokioCommandRunner>,
    pub sites: JsonSiteRegistry,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be determined or the
    /// config file exists but cannot be parsed.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON output goes to stdout alone; progress lines would corrupt it.
        let quiet = flags.output.quiet || flags.output.json;

        let config = YamlConfigStore.load()?.resolve(&sitebox_home()?);
        tracing::debug!(?config, "resolved configuration");

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            fs: LocalToolFs,
            http: UreqDownloader::new(quiet),
            archive: LocalArchiveExtractor,
            templates: TemplateStore::new(config.templates_dir.clone()),
            runtime: DockerCompose::new(TokioCommandRunner::default(), config.compose_timeout),
            sites: JsonSiteRegistry::new(config.sites_dir.clone()),
            config,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn renderer(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    #[must_use]
    pub fn locks(&self) -> FsLocks<'_> {
        FsLocks::new(&self.config)
    }

    /// Installer ports bundled with the resolved configuration.
    #[must_use]
    pub fn admin_tools(
        &self,
    ) -> AdminTools<'_, LocalToolFs, UreqDownloader, LocalArchiveExtractor, TemplateStore> {
        AdminTools {
            fs: &self.fs,
            http: &self.http,
            archive: &self.archive,
            templates: &self.templates,
            config: &self.config,
        }
    }
}

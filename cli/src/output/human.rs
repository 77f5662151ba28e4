//! Human-readable terminal renderer.

use crate::application::services::site_toggle::{
    Reconciliation, SiteStatus, ToggleOutcome,
};
use crate::application::services::tools_install::InstallReport;
use crate::domain::AdminToolsState;
use crate::output::OutputContext;

/// Renders service results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the result of `admin-tools install`.
    pub fn render_install(&self, report: &InstallReport) {
        if report.installed.is_empty() {
            self.ctx.info("All admin tools already installed");
        } else {
            self.ctx
                .success(&format!("Installed {}", report.installed.join(", ")));
        }
        if !report.skipped.is_empty() {
            self.ctx
                .kv("Already present:", &report.skipped.join(", "));
        }
    }

    /// Render the result of `admin-tools enable` / `disable`.
    pub fn render_toggle(&self, outcome: &ToggleOutcome) {
        self.render_reconciliation(&outcome.site, &outcome.reconciliation);
        let verb = match outcome.state {
            AdminToolsState::Enabled => "enabled",
            AdminToolsState::Disabled => "disabled",
        };
        self.ctx
            .success(&format!("Admin tools {verb} for {}", outcome.site));
    }

    /// Render `admin-tools status`.
    pub fn render_status(&self, status: &SiteStatus) {
        self.render_reconciliation(&status.site, &status.reconciliation);
        self.ctx.kv("Site:", &status.site);
        self.ctx.kv("Root:", &status.root.display().to_string());
        self.ctx.kv("Admin tools:", status.state.as_str());
        self.ctx.kv(
            "Overlay:",
            if status.overlay_present { "present" } else { "absent" },
        );
        println!();
        self.ctx.header("Tools:");
        for tool in &status.tools {
            if tool.installed {
                self.ctx.success(&tool.tool);
            } else {
                self.ctx.info(&format!("{} (not installed)", tool.tool));
            }
        }
    }

    fn render_reconciliation(&self, site: &str, reconciliation: &Reconciliation) {
        match reconciliation {
            Reconciliation::Consistent => {}
            Reconciliation::Corrected { from, to } => self.ctx.warn(&format!(
                "Corrected stale admin-tools flag for {site}: {} -> {}",
                from.as_str(),
                to.as_str()
            )),
            Reconciliation::Unknown { reason } => {
                tracing::debug!(site, reason, "container state unknown, trusting stored flag");
            }
        }
    }
}

//! `sitebox admin-tools`: install admin tools and toggle them per site.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::services::site_toggle::{
    ToggleOptions, disable_site, enable_site, site_status,
};
use crate::application::services::tools_install::install_tools;
use crate::domain::SiteError;
use crate::domain::manifest::MANIFEST_EXTENSION;
use crate::infra::templates::seed_default_manifest;
use crate::output::json;

/// Admin-tools subcommands.
#[derive(Subcommand)]
pub enum AdminToolsCommand {
    /// Install missing tools and expose them on a site
    Enable(ToggleArgs),
    /// Stop exposing the tools on a site
    Disable(ToggleArgs),
    /// Install missing tools without touching any site
    Install,
    /// Show admin-tools state for a site
    Status(SiteArgs),
}

/// Arguments for `enable` and `disable`.
#[derive(Args)]
pub struct ToggleArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Re-apply even if the site is already in the requested state
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct SiteArgs {
    /// Site name (defaults to the site containing the current directory)
    pub site: Option<String>,
}

/// Run an admin-tools subcommand.
///
/// # Errors
///
/// Returns any error raised by the underlying service.
pub async fn run(app: &AppContext, cmd: AdminToolsCommand) -> Result<ExitCode> {
    match cmd {
        AdminToolsCommand::Install => install(app).await,
        AdminToolsCommand::Enable(args) => enable(app, &args).await,
        AdminToolsCommand::Disable(args) => disable(app, &args).await,
        AdminToolsCommand::Status(args) => status(app, &args).await,
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("cannot determine current directory")
}

/// Seed the default manifest on first use.
fn prepare_manifest(app: &AppContext) -> Result<()> {
    let path = &app.config.manifest_path;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(MANIFEST_EXTENSION));
    if is_json && seed_default_manifest(path)? {
        app.output
            .info(&format!("Wrote default manifest to {}", path.display()));
    }
    Ok(())
}

async fn install(app: &AppContext) -> Result<ExitCode> {
    prepare_manifest(app)?;
    let report = install_tools(&app.admin_tools(), &app.locks(), &app.reporter()).await?;
    if app.is_json() {
        println!("{}", json::to_json(&report)?);
    } else {
        app.renderer().render_install(&report);
    }
    Ok(ExitCode::SUCCESS)
}

async fn enable(app: &AppContext, args: &ToggleArgs) -> Result<ExitCode> {
    prepare_manifest(app)?;
    let cwd = current_dir()?;
    let opts = ToggleOptions {
        site: args.site.site.as_deref(),
        cwd: &cwd,
        force: args.force,
    };
    let result = enable_site(
        &app.admin_tools(),
        &app.runtime,
        &app.sites,
        &app.locks(),
        &app.reporter(),
        opts,
    )
    .await;
    finish_toggle(app, result)
}

async fn disable(app: &AppContext, args: &ToggleArgs) -> Result<ExitCode> {
    let cwd = current_dir()?;
    let opts = ToggleOptions {
        site: args.site.site.as_deref(),
        cwd: &cwd,
        force: args.force,
    };
    let result = disable_site(
        &app.fs,
        &app.config,
        &app.runtime,
        &app.sites,
        &app.locks(),
        &app.reporter(),
        opts,
    )
    .await;
    finish_toggle(app, result)
}

fn finish_toggle(
    app: &AppContext,
    result: Result<crate::application::services::site_toggle::ToggleOutcome>,
) -> Result<ExitCode> {
    match result {
        Ok(outcome) => {
            if app.is_json() {
                println!("{}", json::to_json(&outcome)?);
            } else {
                app.renderer().render_toggle(&outcome);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e)
            if matches!(
                e.downcast_ref::<SiteError>(),
                Some(SiteError::PersistAfterApply { .. })
            ) =>
        {
            if app.is_json() {
                println!("{}", json::format_error(&format!("{e:#}"), super::error_code(&e))?);
            } else {
                app.output.warn(&format!("{e:#}"));
                app.output
                    .warn("Run `sitebox admin-tools status` to reconcile the site record.");
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e),
    }
}

async fn status(app: &AppContext, args: &SiteArgs) -> Result<ExitCode> {
    let cwd = current_dir()?;
    let opts = ToggleOptions {
        site: args.site.as_deref(),
        cwd: &cwd,
        force: false,
    };
    let status = site_status(
        &app.fs,
        &app.config,
        &app.runtime,
        &app.sites,
        &app.locks(),
        opts,
    )
    .await?;
    if app.is_json() {
        println!("{}", json::to_json(&status)?);
    } else {
        app.renderer().render_status(&status);
    }
    Ok(ExitCode::SUCCESS)
}

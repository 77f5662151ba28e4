//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Manifest errors ───────────────────────────────────────────────────────────

/// Errors raised while loading the admin-tools manifest.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("Manifest {path} must be a .json file.")]
    Format { path: String },

    #[error("Cannot read manifest {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Cannot parse manifest {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Manifest {path} does not declare any tools.")]
    Empty { path: String },
}

// ── Tool installation errors ──────────────────────────────────────────────────

/// Errors raised while installing a single admin tool. All of them abort the
/// whole installation run.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("No installer registered for tool '{0}'.")]
    UnknownTool(String),

    #[error("Invalid manifest entry for '{tool}': {reason}")]
    InvalidDescriptor { tool: String, reason: String },

    #[error("Download of {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Cannot extract {archive}: {reason}")]
    Extraction { archive: String, reason: String },
}

// ── Site errors ───────────────────────────────────────────────────────────────

/// Errors related to the site admin-tools toggle.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Site '{0}' not found or not enabled.")]
    NotFound(String),

    #[error("Invalid site name '{0}': must be a lowercase domain-like name")]
    InvalidName(String),

    #[error("Admin tools are already enabled for '{0}'. Use --force to re-apply.")]
    AlreadyEnabled(String),

    #[error("Admin tools are already disabled for '{0}'. Use --force to re-apply.")]
    AlreadyDisabled(String),

    #[error("Site '{site}' is not supported: its composition lacks the '{missing}' service.")]
    UnsupportedSiteType { site: String, missing: String },

    #[error("Failed to apply container composition for '{site}': {reason}")]
    ComposeApply { site: String, reason: String },

    #[error(
        "Containers for '{site}' were updated but the site record could not be saved: {reason}"
    )]
    PersistAfterApply { site: String, reason: String },
}

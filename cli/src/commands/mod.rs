//! Command implementations

pub mod admin_tools;

use crate::domain::{ManifestError, SiteError, ToolError};

/// Stable machine-readable code for `--json` error objects.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if err.downcast_ref::<ManifestError>().is_some() {
        return "manifest_error";
    }
    if let Some(e) = err.downcast_ref::<ToolError>() {
        return match e {
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::InvalidDescriptor { .. } => "invalid_descriptor",
            ToolError::Network { .. } => "network_error",
            ToolError::Extraction { .. } => "extraction_error",
        };
    }
    if let Some(e) = err.downcast_ref::<SiteError>() {
        return match e {
            SiteError::NotFound(_) => "site_not_found",
            SiteError::InvalidName(_) => "invalid_site_name",
            SiteError::AlreadyEnabled(_) => "already_enabled",
            SiteError::AlreadyDisabled(_) => "already_disabled",
            SiteError::UnsupportedSiteType { .. } => "unsupported_site_type",
            SiteError::ComposeApply { .. } => "compose_apply_failed",
            SiteError::PersistAfterApply { .. } => "persist_after_apply",
        };
    }
    "error"
}

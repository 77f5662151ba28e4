//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod manifest;
pub mod site;
pub mod template;
pub mod tool;

pub use config::{SiteboxConfig, ToolsConfig};
pub use error::{ManifestError, SiteError, ToolError};
pub use manifest::{ToolManifest, ToolManifestEntry};
pub use site::{AdminToolsState, SiteRecord};
pub use tool::ToolKind;

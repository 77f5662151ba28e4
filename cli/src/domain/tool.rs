//! Known admin tools and their on-disk artifact names.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Pinned predis release bundled into the cache admin UI's vendor folder.
pub const PREDIS_URL: &str = "https://github.com/predis/predis/archive/refs/tags/v1.1.10.zip";

/// Length of the cookie-encryption secret written into the database admin config.
pub const SECRET_LEN: usize = 32;

/// The admin tools this subsystem knows how to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Landing page linking to the other tools.
    Index,
    /// `phpinfo()` page.
    PhpInfo,
    /// phpMyAdmin.
    DatabaseAdmin,
    /// phpRedisAdmin.
    CacheAdmin,
    /// opcache-gui single-file inspector.
    OpcacheInspector,
}

impl ToolKind {
    /// Every known tool, in the default manifest order.
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Index,
        ToolKind::PhpInfo,
        ToolKind::DatabaseAdmin,
        ToolKind::CacheAdmin,
        ToolKind::OpcacheInspector,
    ];

    /// Map a manifest key to a tool.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    /// Manifest key and base name under the tools root.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            ToolKind::Index => "index",
            ToolKind::PhpInfo => "phpinfo",
            ToolKind::DatabaseAdmin => "pma",
            ToolKind::CacheAdmin => "phpredisadmin",
            ToolKind::OpcacheInspector => "opcache",
        }
    }

    /// Suffix appended to the base name to form the installed artifact.
    ///
    /// Directory tools have no suffix. The opcache inspector is a single file
    /// probed and installed as `opcache-gui.php`.
    #[must_use]
    pub fn artifact_suffix(self) -> &'static str {
        match self {
            ToolKind::Index | ToolKind::PhpInfo => ".php",
            ToolKind::OpcacheInspector => "-gui.php",
            ToolKind::DatabaseAdmin | ToolKind::CacheAdmin => "",
        }
    }

    /// `true` when the artifact is a directory tree rather than one file.
    #[must_use]
    pub fn is_bundle(self) -> bool {
        matches!(self, ToolKind::DatabaseAdmin | ToolKind::CacheAdmin)
    }
}

/// Normalize a tool id to the artifact name probed under the tools root.
///
/// Unknown ids map to themselves.
#[must_use]
pub fn artifact_name(tool_id: &str) -> String {
    match ToolKind::from_id(tool_id) {
        Some(kind) => format!("{}{}", kind.id(), kind.artifact_suffix()),
        None => tool_id.to_string(),
    }
}

/// Generate a fresh alphanumeric secret of [`SECRET_LEN`] characters.
#[must_use]
pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect()
}

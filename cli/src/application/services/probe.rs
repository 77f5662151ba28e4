//! Application service: installation state probing.
//!
//! State is derived from the filesystem on every call and never cached.

use std::path::{Path, PathBuf};

use crate::application::ports::ToolFs;
use crate::domain::tool::artifact_name;

/// Reports which tools already have an artifact under the tools root.
pub struct InstallProbe<'a, F: ToolFs> {
    fs: &'a F,
    tools_root: &'a Path,
}

impl<'a, F: ToolFs> InstallProbe<'a, F> {
    pub fn new(fs: &'a F, tools_root: &'a Path) -> Self {
        Self { fs, tools_root }
    }

    /// Path of the artifact `tool_id` installs to.
    #[must_use]
    pub fn artifact_path(&self, tool_id: &str) -> PathBuf {
        self.tools_root.join(artifact_name(tool_id))
    }

    /// `Some(tool)` probes that tool's artifact; `None` probes the tools root.
    #[must_use]
    pub fn is_installed(&self, tool_id: Option<&str>) -> bool {
        match tool_id {
            Some(id) => self.fs.exists(&self.artifact_path(id)),
            None => self.fs.is_dir(self.tools_root),
        }
    }
}

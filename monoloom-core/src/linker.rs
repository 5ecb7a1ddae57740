//! Workspace aliasing into the resolution root.
//!
//! The workspace root is aliased as `<basePath>/node_modules` (and as
//! `<basePath>/<scope>` when scoping is configured) so module resolution
//! falls back into the workspace itself. Aliases are best-effort: creation
//! failures are reported but never abort the install.

use std::path::{Path, PathBuf};

use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};

/// Name of the shared resolution root aliased into the workspace.
pub const RESOLUTION_ROOT: &str = "node_modules";

/// Alias locations for this workspace, each pointing back at the root.
pub fn alias_links(config: &WorkspaceConfig) -> Vec<PathBuf> {
    let mut links = vec![config.base_path.join(RESOLUTION_ROOT)];
    if let Some(scope) = &config.scope {
        links.push(config.base_path.join(scope));
    }
    links
}

/// Creates one filesystem alias pointing at the workspace root.
///
/// A symbolic link on Unix; a directory symlink (junction-equivalent) on
/// Windows. The target is the relative `.` so the link stays valid if the
/// workspace moves.
pub async fn create_alias(link: &Path) -> Result<()> {
    let link = link.to_path_buf();

    #[cfg(unix)]
    {
        tokio::fs::symlink(".", &link).await.map_err(|e| Error::Link {
            path: link,
            message: e.to_string(),
        })
    }

    #[cfg(windows)]
    {
        tokio::task::spawn_blocking(move || {
            std::os::windows::fs::symlink_dir(".", &link).map_err(|e| Error::Link {
                path: link.clone(),
                message: e.to_string(),
            })
        })
        .await
        .map_err(|e| Error::Join(e.to_string()))?
    }
}

//! Workspace version-metadata loading.
//!
//! Versions come from manifests under the resolution root plus the
//! workspace's own package manifests. A semver-parsable version is lock
//! metadata and gets range-prefixed when pinned; anything else is a
//! floating tag used verbatim.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use monoloom_core::analyzer::{VersionMeta, VersionTable};
use monoloom_core::error::{Error, Result};

pub(crate) async fn load(
    base_path: &Path,
    workspace: &HashMap<String, PathBuf>,
) -> Result<VersionTable> {
    let base = base_path.to_path_buf();
    let workspace = workspace.clone();
    tokio::task::spawn_blocking(move || build_table(&base, &workspace))
        .await
        .map_err(|e| Error::Join(e.to_string()))?
}

fn build_table(base: &Path, workspace: &HashMap<String, PathBuf>) -> Result<VersionTable> {
    let mut table = VersionTable::new();

    // The resolution root is usually an alias; canonicalize before walking
    // so the walk descends into the real directory.
    if let Ok(root) = std::fs::canonicalize(base.join("node_modules")) {
        for entry in WalkDir::new(&root)
            .min_depth(2)
            .max_depth(3)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_name() != "package.json" || !entry.file_type().is_file() {
                continue;
            }
            // Depth three only holds manifests of scoped packages.
            if entry.depth() == 3 && !under_scope_dir(entry.path()) {
                continue;
            }
            if let Some((name, meta)) = read_manifest_meta(entry.path()) {
                table.insert(name, meta);
            }
        }
    }

    // Workspace packages win over any stale copies under the root.
    for (full_name, dir) in workspace {
        if let Some((_, meta)) = read_manifest_meta(&dir.join("package.json")) {
            table.insert(full_name.clone(), meta);
        }
    }

    debug!(entries = table.len(), "version table built");
    Ok(table)
}

fn under_scope_dir(manifest_path: &Path) -> bool {
    manifest_path
        .parent()
        .and_then(|p| p.parent())
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().starts_with('@'))
        .unwrap_or(false)
}

fn read_manifest_meta(path: &Path) -> Option<(String, VersionMeta)> {
    let content = std::fs::read_to_string(path).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&content).ok()?;

    let name = manifest.get("name")?.as_str()?.to_string();
    let version = manifest.get("version")?.as_str()?;

    let meta = match semver::Version::parse(version) {
        Ok(_) => VersionMeta::Locked(version.to_string()),
        Err(_) => VersionMeta::Suggested(version.to_string()),
    };
    Some((name, meta))
}

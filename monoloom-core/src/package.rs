//! Package data model.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::config::WorkspaceConfig;
use crate::manifest::{ManifestDocument, MANIFEST_FILE};

/// A declared package in the workspace.
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    /// Short name as keyed in the config's package map.
    pub name: String,
    /// Scope-qualified full name (`scope/name`, or just `name` unscoped).
    pub full_name: String,
    /// Directory holding the package's sources and manifest.
    pub dir: PathBuf,
    /// Per-package manifest override fields from the config.
    pub overrides: Map<String, Value>,
    /// In-memory manifest, present once the scaffold pass has run.
    pub manifest: Option<ManifestDocument>,
    /// Resolved reference-file path, present once the workspace-wide naming
    /// policy has been resolved.
    pub reference_path: Option<PathBuf>,
}

impl PackageDescriptor {
    pub fn new(config: &WorkspaceConfig, name: &str, overrides: Map<String, Value>) -> Self {
        Self {
            name: name.to_string(),
            full_name: config.full_name(name),
            dir: config.package_dir(name),
            overrides,
            manifest: None,
            reference_path: None,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }
}

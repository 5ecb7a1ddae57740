//! Workspace configuration parsing.
//!
//! The config file (`packages.json` by convention) declares the workspace
//! root, an optional scope prefix, the set of managed packages with their
//! per-package manifest overrides, and the template/bundler inputs. It is
//! loaded once per run and read-only afterwards.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Per-package build-reference naming configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsconfigPaths {
    /// Naming policy for each package's reference file. May be a bare stem
    /// (`"build"`), a directory-like prefix (`"build/"`), or a full file
    /// name (`"tsconfig.build.json"`).
    pub references_in: Option<String>,
    /// File name of the workspace-root aggregate reference document.
    pub references_out: Option<String>,
}

/// Workspace configuration as declared in the config file.
///
/// Field names follow the on-disk camelCase convention. Unrecognized fields
/// are preserved in `extra` so a round-trip does not lose information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Workspace root. Relative paths are resolved against the directory
    /// containing the config file at load time.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Optional scope prefix; a package `foo` becomes `<scope>/foo`.
    pub scope: Option<String>,

    /// Static file fan-out: target path -> source path, both relative to
    /// the workspace root. `$NAME` in either side expands per package.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub copy_files: IndexMap<String, String>,

    /// Shared manifest template. When absent, manifests are not managed for
    /// this workspace and dependency pinning is skipped entirely.
    pub package_template: Option<PathBuf>,

    /// Shared build-config template.
    pub tsconfig_template: Option<PathBuf>,

    /// Build-reference naming policy.
    pub tsconfig_paths: Option<TsconfigPaths>,

    pub rollup_config: Option<PathBuf>,
    pub bundle_path: Option<PathBuf>,
    pub bundle_min_path: Option<PathBuf>,

    /// Declared packages in declaration order: short name -> override fields
    /// merged into that package's manifest ahead of the template.
    pub packages: IndexMap<String, serde_json::Map<String, Value>>,

    /// Pass-through bag for fields this tool does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn default_base_path() -> PathBuf {
    PathBuf::from(".")
}

impl WorkspaceConfig {
    /// Loads and parses the config file, resolving `basePath` and the
    /// template paths against the config file's own directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` for a missing file and `Json` for malformed
    /// content. Both are fatal before any other I/O happens.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ConfigNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let mut config: WorkspaceConfig = serde_json::from_str(&content)
            .map_err(|e| Error::json(e, path.display().to_string()))?;

        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.base_path = config_dir.join(&config.base_path);
        for template in [
            &mut config.package_template,
            &mut config.tsconfig_template,
            &mut config.rollup_config,
        ]
        .into_iter()
        .flatten()
        {
            *template = config_dir.join(&*template);
        }

        if config.packages.is_empty() {
            return Err(Error::InvalidConfig(
                "config declares no packages".to_string(),
            ));
        }

        Ok(config)
    }

    /// Scope-qualified full name for a short package name.
    pub fn full_name(&self, short_name: &str) -> String {
        match &self.scope {
            Some(scope) => format!("{}/{}", scope, short_name),
            None => short_name.to_string(),
        }
    }

    /// Directory holding a package's sources and manifest. The scope alias
    /// makes `<basePath>/<scope>/<name>` resolve to the same directory.
    pub fn package_dir(&self, short_name: &str) -> PathBuf {
        self.base_path.join(short_name)
    }

    /// Per-package reference naming policy, if configured.
    pub fn references_in(&self) -> Option<&str> {
        self.tsconfig_paths
            .as_ref()
            .and_then(|p| p.references_in.as_deref())
    }

    /// Aggregate reference document name, defaulting to `tsconfig.json`.
    pub fn references_out(&self) -> &str {
        self.tsconfig_paths
            .as_ref()
            .and_then(|p| p.references_out.as_deref())
            .unwrap_or("tsconfig.json")
    }
}

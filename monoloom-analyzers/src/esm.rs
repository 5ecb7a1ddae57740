//! Regex-based static-import scanner for ES/TS sources.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use monoloom_core::analyzer::{ModuleAnalyzer, VersionTable};
use monoloom_core::config::WorkspaceConfig;
use monoloom_core::error::{Error, Result};
use monoloom_core::package::PackageDescriptor;

use crate::versions;

/// Matches the specifier of `import ... from`, `export ... from`, bare
/// `import "x"` and `require("x")` forms.
static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        (?: \bimport \s+ (?: [\w$*\s{},]* \s+ from \s+ )?
          | \bexport \s+ [\w$*\s{},]+ \s+ from \s+
          | \brequire \s* \( \s*
        )
        ["']([^"']+)["']"#,
    )
    .expect("import regex")
});

/// Extensions tried when a relative specifier omits one.
const EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];

/// Entry candidates relative to a package directory, tried in order when
/// the manifest names no entry itself.
const ENTRY_CANDIDATES: [&str; 4] = ["src/index.ts", "index.ts", "src/index.js", "index.js"];

/// Static analyzer over a package's transitive imports.
///
/// Relative specifiers are followed file-to-file; bare specifiers are
/// canonicalized to package names and, when they name another workspace
/// package, recursed into so the returned set is the transitive closure.
pub struct EsModuleAnalyzer {
    base_path: PathBuf,
    /// Workspace packages by full name, for closure recursion.
    workspace: HashMap<String, PathBuf>,
}

impl EsModuleAnalyzer {
    pub fn new(config: &WorkspaceConfig) -> Self {
        let workspace = config
            .packages
            .keys()
            .map(|name| (config.full_name(name), config.package_dir(name)))
            .collect();
        Self {
            base_path: config.base_path.clone(),
            workspace,
        }
    }

    async fn resolve_entry(&self, dir: &Path) -> Result<PathBuf> {
        // `module` beats `main`, matching bundler-first resolution.
        if let Ok(content) = tokio::fs::read_to_string(dir.join("package.json")).await {
            if let Ok(manifest) = serde_json::from_str::<serde_json::Value>(&content) {
                for field in ["module", "main"] {
                    if let Some(rel) = manifest.get(field).and_then(|v| v.as_str()) {
                        if let Some(found) = resolve_relative(dir, rel).await {
                            return Ok(found);
                        }
                    }
                }
            }
        }

        for candidate in ENTRY_CANDIDATES {
            let path = dir.join(candidate);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(path);
            }
        }

        Err(Error::Analysis {
            package: dir.display().to_string(),
            message: "no source entry found".to_string(),
        })
    }
}

#[async_trait]
impl ModuleAnalyzer for EsModuleAnalyzer {
    async fn load_version_table(&self) -> Result<VersionTable> {
        versions::load(&self.base_path, &self.workspace).await
    }

    async fn analyze(&self, package: &PackageDescriptor) -> Result<Vec<String>> {
        let entry = self.resolve_entry(&package.dir).await?;

        let mut dependencies: IndexSet<String> = IndexSet::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut pending = vec![entry];

        while let Some(file) = pending.pop() {
            if !visited.insert(file.clone()) {
                continue;
            }
            let content =
                tokio::fs::read_to_string(&file)
                    .await
                    .map_err(|e| Error::Analysis {
                        package: package.name.clone(),
                        message: format!("{}: {}", file.display(), e),
                    })?;

            let file_dir = file.parent().unwrap_or(Path::new(".")).to_path_buf();
            for captures in IMPORT_RE.captures_iter(&content) {
                let specifier = &captures[1];

                if specifier.starts_with('.') {
                    match resolve_relative(&file_dir, specifier).await {
                        Some(next) => pending.push(next),
                        None => {
                            debug!(package = %package.name, specifier, "unresolved relative import")
                        }
                    }
                    continue;
                }
                if specifier.starts_with("node:") {
                    continue;
                }

                let canonical = canonical_package(specifier);
                if dependencies.insert(canonical.clone()) {
                    if let Some(dir) = self.workspace.get(&canonical) {
                        if let Ok(next) = self.resolve_entry(dir).await {
                            pending.push(next);
                        }
                    }
                }
            }
        }

        Ok(dependencies.into_iter().collect())
    }
}

/// Canonical package name of a bare specifier: two segments for scoped
/// names, one otherwise; deep-import suffixes are dropped.
fn canonical_package(specifier: &str) -> String {
    let mut segments = specifier.splitn(3, '/');
    match (segments.next(), segments.next()) {
        (Some(scope), Some(name)) if scope.starts_with('@') => format!("{}/{}", scope, name),
        (Some(name), _) => name.to_string(),
        (None, _) => specifier.to_string(),
    }
}

/// Resolves a relative specifier against `dir`, trying the path verbatim,
/// with each known extension, and as a directory index.
async fn resolve_relative(dir: &Path, specifier: &str) -> Option<PathBuf> {
    let base = dir.join(specifier);

    if tokio::fs::metadata(&base).await.is_ok_and(|m| m.is_file()) {
        return Some(base);
    }
    for ext in EXTENSIONS {
        // Append the extension; a dot in the specifier is part of the stem.
        let candidate = dir.join(format!("{}.{}", specifier, ext));
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }
    for ext in EXTENSIONS {
        let candidate = base.join(format!("index.{}", ext));
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}

//! Module-graph analyzer seam.
//!
//! The analyzer itself is a collaborator behind a trait; the core only
//! consumes its output. A reference implementation lives in the
//! `monoloom-analyzers` crate.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::package::PackageDescriptor;

/// Version metadata for one dependency name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionMeta {
    /// Exact version resolved from lock metadata; pinned as
    /// `<range-prefix><version>`.
    Locked(String),
    /// Floating tag (e.g. a dist-tag) used verbatim as the specifier.
    Suggested(String),
}

/// Workspace-wide dependency version table, built once per run and shared
/// read-only by every pinning task.
#[derive(Debug, Clone, Default)]
pub struct VersionTable {
    entries: HashMap<String, VersionMeta>,
}

impl VersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, meta: VersionMeta) {
        self.entries.insert(name.into(), meta);
    }

    pub fn get(&self, name: &str) -> Option<&VersionMeta> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Static module-graph analysis over a package's source.
#[async_trait]
pub trait ModuleAnalyzer: Send + Sync {
    /// Builds the workspace-wide version-metadata table. Invoked once per
    /// run, before any per-package analysis starts.
    async fn load_version_table(&self) -> Result<VersionTable>;

    /// Resolves the transitive set of statically-imported dependencies for
    /// the package rooted at `package.dir`, as canonical full names in the
    /// order the analyzer encounters them. The closure is already
    /// transitive; callers must not expand it further.
    async fn analyze(&self, package: &PackageDescriptor) -> Result<Vec<String>>;
}

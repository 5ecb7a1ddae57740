//! Build-reference documents and the cross-package reference graph.
//!
//! Each managed package gets a reference document listing the packages that
//! must build first, expressed as paths relative to its own reference file.
//! A single aggregate document at the workspace root fans out to every
//! package and is never itself compiled.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default file name when the naming policy is directory-like.
pub const DEFAULT_REFERENCE_FILE: &str = "tsconfig.json";

/// Extension appended when the naming policy is a bare stem.
pub const DEFAULT_REFERENCE_EXT: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub path: String,
}

/// On-disk reference document shape:
/// `{ "references": [{"path": ...}], "files": [] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub references: Vec<ReferenceEntry>,
    pub files: Vec<String>,
}

impl ReferenceDocument {
    pub fn push(&mut self, path: String) {
        self.references.push(ReferenceEntry { path });
    }

    pub fn render(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)
            .map_err(|e| Error::json(e, "reference document"))?;
        text.push('\n');
        Ok(text)
    }
}

/// Resolves the configured naming policy to the concrete per-package
/// reference-file path, relative to each package directory.
///
/// A trailing separator marks the policy as directory-like; a recognized
/// extension means it is already a file name. A bare stem is ambiguous:
/// every package directory is probed for a same-named subdirectory, and one
/// hit anywhere makes the policy directory-like for the whole workspace.
pub fn resolve_reference_path(policy: &str, package_dirs: &[PathBuf]) -> PathBuf {
    if policy.ends_with('/') || policy.ends_with(std::path::MAIN_SEPARATOR) {
        return Path::new(policy).join(DEFAULT_REFERENCE_FILE);
    }

    let as_path = Path::new(policy);
    if as_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DEFAULT_REFERENCE_EXT))
    {
        return as_path.to_path_buf();
    }

    let directory_like = package_dirs.iter().any(|dir| dir.join(policy).is_dir());
    if directory_like {
        as_path.join(DEFAULT_REFERENCE_FILE)
    } else {
        PathBuf::from(format!("{}.{}", policy, DEFAULT_REFERENCE_EXT))
    }
}

/// Path of `to` relative to the directory containing `from`, rendered with
/// forward slashes as reference documents expect.
pub fn relative_reference(from: &Path, to: &Path) -> Option<String> {
    let from_dir = from.parent()?;
    let diff = pathdiff::diff_paths(to, from_dir)?;

    let mut parts = Vec::new();
    for component in diff.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => parts.push("..".to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

/// Builds the workspace-root aggregate document: one reference per declared
/// package, declaration order, empty file list.
pub fn aggregate_document(base_path: &Path, reference_paths: &[PathBuf]) -> ReferenceDocument {
    let mut doc = ReferenceDocument::default();
    for path in reference_paths {
        let relative = pathdiff::diff_paths(path, base_path).unwrap_or_else(|| path.clone());
        let rendered = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        doc.push(rendered);
    }
    doc
}

/// Directed graph of cross-package reference edges, accumulated while
/// pinning. Used to surface cycles and the topological build order.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(idx) = self.node_map.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.node_map.insert(name.to_string(), idx);
        idx
    }

    /// Records that `from` references `to`, i.e. `to` must build first.
    pub fn add_reference(&mut self, from: &str, to: &str) {
        let from_node = self.node(from);
        let to_node = self.node(to);
        self.graph.add_edge(from_node, to_node, ());
    }

    /// Build order with dependencies first.
    ///
    /// # Errors
    ///
    /// Returns `CircularReference` when the accumulated edges contain a
    /// cycle; the type-checking compiler rejects cyclic project references.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            Error::CircularReference(format!(
                "cycle involving: {}",
                self.graph[cycle.node_id()]
            ))
        })?;

        Ok(sorted
            .into_iter()
            .rev()
            .map(|idx| self.graph[idx].clone())
            .collect())
    }
}

//! Compiler driver contract.
//!
//! The type-checking compiler and bundler live outside this crate; the core
//! only prepares their inputs. Per package that means derived compile
//! options, the source set from its reference document, and an emit
//! destination keyed by source identity so the bundler can consume freshly
//! emitted text without a storage round-trip.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::package::PackageDescriptor;
use crate::references::ReferenceDocument;

/// Derives compile options from the shared build-config template, forcing
/// off intermediate declaration and source-map emission. The bundler works
/// from emitted text directly, so neither artifact is ever wanted.
pub fn derive_options(base: Option<&Map<String, Value>>) -> Map<String, Value> {
    let mut options = base.cloned().unwrap_or_default();
    options.insert("declaration".to_string(), Value::Bool(false));
    options.insert("sourceMap".to_string(), Value::Bool(false));
    options
}

/// Compile inputs for one package.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub package: String,
    pub options: Map<String, Value>,
    /// Source files as listed in the package's reference document.
    pub sources: Vec<String>,
}

impl CompileRequest {
    pub fn for_package(
        package: &PackageDescriptor,
        document: &ReferenceDocument,
        base_options: Option<&Map<String, Value>>,
    ) -> Self {
        Self {
            package: package.full_name.clone(),
            options: derive_options(base_options),
            sources: document.files.clone(),
        }
    }
}

/// Destination for emitted text, keyed by canonical source path.
pub trait EmitSink: Send {
    fn emit(&mut self, source: &Path, text: String);
}

/// In-memory sink handed to the downstream bundler.
#[derive(Debug, Default)]
pub struct MemoryEmitSink {
    outputs: HashMap<PathBuf, String>,
}

impl MemoryEmitSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &Path) -> Option<&str> {
        self.outputs.get(source).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl EmitSink for MemoryEmitSink {
    fn emit(&mut self, source: &Path, text: String) {
        self.outputs.insert(source.to_path_buf(), text);
    }
}

//! Core library for monorepo workspace installation.
//!
//! Links packages into a shared resolution root, synthesizes manifests from
//! a template plus per-package overrides, pins dependency versions from
//! static analysis, and writes the cross-package build-reference documents.

pub mod analyzer;
pub mod compiler;
pub mod config;
pub mod copies;
pub mod error;
pub mod installer;
pub mod linker;
pub mod manifest;
pub mod package;
pub mod pin;
pub mod references;
pub mod report;

pub use analyzer::{ModuleAnalyzer, VersionMeta, VersionTable};
pub use compiler::{CompileRequest, EmitSink, MemoryEmitSink};
pub use config::{TsconfigPaths, WorkspaceConfig};
pub use error::{Error, Result};
pub use installer::{InstallOutcome, Installer};
pub use manifest::ManifestDocument;
pub use package::PackageDescriptor;
pub use pin::RangePrefix;
pub use references::{ReferenceDocument, ReferenceGraph};
pub use report::{PackageReport, RunReport, StepOutcome};

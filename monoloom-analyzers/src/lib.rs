//! Module-graph analyzers for Monoloom.
//!
//! Ships the reference [`monoloom_core::ModuleAnalyzer`] implementation: a
//! regex-based scanner over ES/TS static imports plus a node_modules
//! version-metadata loader.

mod esm;
mod versions;

pub use esm::EsModuleAnalyzer;

//! Dependency version pinning.

use crate::analyzer::{VersionMeta, VersionTable};

/// Range prefix prepended to locked versions when computing a specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePrefix {
    /// Compatible-release (`~1.2.3`). The default.
    #[default]
    CompatibleRelease,
    /// Compatible-minor (`^1.2.3`).
    CompatibleMinor,
    /// Exact match, no prefix.
    Exact,
}

impl RangePrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangePrefix::CompatibleRelease => "~",
            RangePrefix::CompatibleMinor => "^",
            RangePrefix::Exact => "",
        }
    }
}

/// Computes the specifier for one dependency from its version metadata.
///
/// Suggested (floating) versions are used verbatim; locked versions get the
/// range prefix. Returns `None` when the dependency has no metadata at all,
/// in which case no specifier is written and the omission is reported.
pub fn pin_specifier(table: &VersionTable, name: &str, prefix: RangePrefix) -> Option<String> {
    match table.get(name)? {
        VersionMeta::Suggested(tag) => Some(tag.clone()),
        VersionMeta::Locked(version) => Some(format!("{}{}", prefix.as_str(), version)),
    }
}

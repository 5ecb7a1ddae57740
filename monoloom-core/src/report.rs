//! Run-level reporting.
//!
//! The install isolates failures per package instead of aborting, and every
//! recovered failure lands here rather than being silently dropped.

use std::path::PathBuf;

use serde::Serialize;

/// Outcome of one install step for one package or workspace resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Succeeded,
    Skipped,
    Failed(String),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub path: PathBuf,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    pub target: PathBuf,
    pub outcome: StepOutcome,
}

/// Per-package step outcomes.
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub name: String,
    pub scaffold: StepOutcome,
    pub analysis: StepOutcome,
    pub manifest: StepOutcome,
    pub reference: StepOutcome,
    /// Dependencies that received a pinned specifier.
    pub pinned: Vec<String>,
    /// Dependencies with no entry in the version table; left unpinned.
    pub unpinned: Vec<String>,
}

impl PackageReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scaffold: StepOutcome::Skipped,
            analysis: StepOutcome::Skipped,
            manifest: StepOutcome::Skipped,
            reference: StepOutcome::Skipped,
            pinned: Vec::new(),
            unpinned: Vec::new(),
        }
    }

    pub fn has_failure(&self) -> bool {
        self.scaffold.is_failed()
            || self.analysis.is_failed()
            || self.manifest.is_failed()
            || self.reference.is_failed()
    }
}

/// Everything that happened during one install run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub links: Vec<LinkReport>,
    pub copies: Vec<CopyReport>,
    pub packages: Vec<PackageReport>,
    /// Outcome of the workspace-root aggregate reference write.
    pub aggregate: Option<StepOutcome>,
    /// Cross-package build order, dependencies first. Absent when the
    /// reference graph has a cycle.
    pub build_order: Option<Vec<String>>,
    /// Set when the accumulated references contain a cycle.
    pub cycle_warning: Option<String>,
}

impl RunReport {
    pub fn failure_count(&self) -> usize {
        self.links.iter().filter(|l| l.outcome.is_failed()).count()
            + self.copies.iter().filter(|c| c.outcome.is_failed()).count()
            + self.packages.iter().filter(|p| p.has_failure()).count()
            + usize::from(self.aggregate.as_ref().is_some_and(|a| a.is_failed()))
    }
}

//! Install orchestration.
//!
//! One run has two concurrent phases separated by a single barrier. Phase
//! one creates workspace aliases, fans out static copies, and writes every
//! package's scaffold manifest. Phase two pins dependencies and writes the
//! patched manifests and reference documents, one independent task per
//! package. The barrier exists because analysis may resolve through the
//! workspace aliases and a scaffold must be on disk before it is patched.
//! No two tasks ever write the same file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::analyzer::{ModuleAnalyzer, VersionTable};
use crate::config::WorkspaceConfig;
use crate::copies::{self, CopyPlan};
use crate::error::{Error, Result};
use crate::linker;
use crate::manifest::{self, ManifestDocument};
use crate::package::PackageDescriptor;
use crate::pin::{pin_specifier, RangePrefix};
use crate::references::{self, ReferenceDocument, ReferenceGraph};
use crate::report::{CopyReport, LinkReport, PackageReport, RunReport, StepOutcome};

/// Runs the workspace install end to end.
pub struct Installer {
    config: Arc<WorkspaceConfig>,
    analyzer: Arc<dyn ModuleAnalyzer>,
    range_prefix: RangePrefix,
}

/// Result of one run: the observable report plus the inputs prepared for
/// the downstream compiler driver.
#[derive(Debug)]
pub struct InstallOutcome {
    pub report: RunReport,
    /// Per managed package, its reference document as accumulated during
    /// pinning (empty for packages without workspace-internal deps).
    pub reference_documents: Vec<(String, ReferenceDocument)>,
    /// Base compiler options from the build-config template.
    pub tsconfig_options: Option<Map<String, Value>>,
}

enum Phase1 {
    Link(LinkReport),
    Copy(CopyReport),
    Scaffold {
        index: usize,
        manifest: Option<ManifestDocument>,
        outcome: StepOutcome,
    },
}

struct PinResult {
    index: usize,
    analysis: StepOutcome,
    manifest: StepOutcome,
    reference: StepOutcome,
    pinned: Vec<String>,
    unpinned: Vec<String>,
    /// Cross-package edges by short name: (dependent, dependency).
    edges: Vec<(String, String)>,
    document: ReferenceDocument,
}

impl Installer {
    pub fn new(config: WorkspaceConfig, analyzer: Arc<dyn ModuleAnalyzer>) -> Self {
        Self {
            config: Arc::new(config),
            analyzer,
            range_prefix: RangePrefix::default(),
        }
    }

    /// Selects the range prefix used for locked versions.
    pub fn with_range_prefix(mut self, prefix: RangePrefix) -> Self {
        self.range_prefix = prefix;
        self
    }

    pub async fn install(&self) -> Result<InstallOutcome> {
        let config = &self.config;
        let mut report = RunReport::default();

        let mut packages: Vec<PackageDescriptor> = config
            .packages
            .iter()
            .map(|(name, overrides)| PackageDescriptor::new(config, name, overrides.clone()))
            .collect();
        for pkg in &packages {
            report.packages.push(PackageReport::new(&pkg.name));
        }

        // Template loads are part of the pre-pinning barrier. An
        // unconfigured manifest template means manifests are not managed
        // for this workspace; a configured but unreadable one is a config
        // error and fatal.
        let package_template = match &config.package_template {
            Some(path) => Some(Arc::new(load_template(path).await?)),
            None => None,
        };
        let tsconfig_options = match &config.tsconfig_template {
            Some(path) => Some(load_template(path).await?),
            None => None,
        };

        // The naming policy resolves once, workspace-wide.
        let reference_rel: Option<PathBuf> = config.references_in().map(|policy| {
            let dirs: Vec<PathBuf> = packages.iter().map(|p| p.dir.clone()).collect();
            references::resolve_reference_path(policy, &dirs)
        });
        if let Some(rel) = &reference_rel {
            for pkg in &mut packages {
                pkg.reference_path = Some(pkg.dir.join(rel));
            }
        }

        self.run_phase1(&mut packages, &mut report, package_template.as_ref())
            .await?;

        // Barrier passed: all links, copies, template loads and scaffold
        // writes are done.
        let documents = if package_template.is_some() {
            self.run_phase2(&packages, &mut report).await?
        } else {
            debug!("no package template configured; manifests left unmanaged");
            vec![None; packages.len()]
        };

        if reference_rel.is_some() {
            self.write_aggregate(&packages, &mut report).await;
        }

        let reference_documents = packages
            .iter()
            .zip(documents)
            .map(|(pkg, doc)| (pkg.name.clone(), doc.unwrap_or_default()))
            .collect();

        Ok(InstallOutcome {
            report,
            reference_documents,
            tsconfig_options,
        })
    }

    async fn run_phase1(
        &self,
        packages: &mut [PackageDescriptor],
        report: &mut RunReport,
        template: Option<&Arc<Map<String, Value>>>,
    ) -> Result<()> {
        let mut tasks: JoinSet<Phase1> = JoinSet::new();

        for link in linker::alias_links(&self.config) {
            tasks.spawn(async move {
                let outcome = match linker::create_alias(&link).await {
                    Ok(()) => StepOutcome::Succeeded,
                    Err(e) => StepOutcome::Failed(e.to_string()),
                };
                Phase1::Link(LinkReport {
                    path: link,
                    outcome,
                })
            });
        }

        for plan in copies::expand_copies(&self.config) {
            tasks.spawn(async move {
                let outcome = match copies::copy_one(&plan).await {
                    Ok(()) => StepOutcome::Succeeded,
                    Err(e) => StepOutcome::Failed(e.to_string()),
                };
                let CopyPlan { target, .. } = plan;
                Phase1::Copy(CopyReport { target, outcome })
            });
        }

        if let Some(template) = template {
            for (index, pkg) in packages.iter().enumerate() {
                let template = Arc::clone(template);
                let pkg = pkg.clone();
                tasks.spawn(async move {
                    match scaffold_package(&pkg, &template).await {
                        Ok(manifest) => Phase1::Scaffold {
                            index,
                            manifest: Some(manifest),
                            outcome: StepOutcome::Succeeded,
                        },
                        Err(e) => Phase1::Scaffold {
                            index,
                            manifest: None,
                            outcome: StepOutcome::Failed(e.to_string()),
                        },
                    }
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(|e| Error::Join(e.to_string()))? {
                Phase1::Link(link) => {
                    if let StepOutcome::Failed(message) = &link.outcome {
                        debug!(path = %link.path.display(), %message, "alias not created");
                    }
                    report.links.push(link);
                }
                Phase1::Copy(copy) => {
                    if let StepOutcome::Failed(message) = &copy.outcome {
                        warn!(target = %copy.target.display(), %message, "copy failed");
                    }
                    report.copies.push(copy);
                }
                Phase1::Scaffold {
                    index,
                    manifest,
                    outcome,
                } => {
                    packages[index].manifest = manifest;
                    report.packages[index].scaffold = outcome;
                }
            }
        }

        Ok(())
    }

    async fn run_phase2(
        &self,
        packages: &[PackageDescriptor],
        report: &mut RunReport,
    ) -> Result<Vec<Option<ReferenceDocument>>> {
        let table = match self.analyzer.load_version_table().await {
            Ok(table) => Arc::new(table),
            Err(e) => {
                warn!(error = %e, "version table unavailable; keeping scaffold manifests");
                for pkg in report.packages.iter_mut() {
                    if !pkg.scaffold.is_failed() {
                        pkg.analysis = StepOutcome::Failed(e.to_string());
                    }
                }
                return Ok(vec![None; packages.len()]);
            }
        };
        debug!(entries = table.len(), "version table loaded");

        // Reference targets by full name, for resolving entries to other
        // configured packages only.
        let targets: Arc<HashMap<String, (String, PathBuf)>> = Arc::new(
            packages
                .iter()
                .filter_map(|p| {
                    p.reference_path
                        .as_ref()
                        .map(|path| (p.full_name.clone(), (p.name.clone(), path.clone())))
                })
                .collect(),
        );

        let mut tasks: JoinSet<PinResult> = JoinSet::new();
        for (index, pkg) in packages.iter().enumerate() {
            // Packages whose scaffold never landed keep template-less
            // manifests out of the picture; nothing to patch.
            let Some(manifest) = pkg.manifest.clone() else {
                continue;
            };
            let pkg = pkg.clone();
            let analyzer = Arc::clone(&self.analyzer);
            let table = Arc::clone(&table);
            let targets = Arc::clone(&targets);
            let prefix = self.range_prefix;
            tasks.spawn(async move {
                pin_package(index, pkg, manifest, analyzer, table, targets, prefix).await
            });
        }

        let mut graph = ReferenceGraph::new();
        let mut any_edges = false;
        let mut documents: Vec<Option<ReferenceDocument>> = vec![None; packages.len()];

        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| Error::Join(e.to_string()))?;
            let entry = &mut report.packages[result.index];
            entry.analysis = result.analysis;
            entry.manifest = result.manifest;
            entry.reference = result.reference;
            entry.pinned = result.pinned;
            entry.unpinned = result.unpinned;
            for (from, to) in &result.edges {
                graph.add_reference(from, to);
                any_edges = true;
            }
            documents[result.index] = Some(result.document);
        }

        if any_edges {
            match graph.topological_order() {
                Ok(order) => {
                    debug!(?order, "cross-package build order");
                    report.build_order = Some(order);
                }
                Err(e) => {
                    warn!(error = %e, "reference cycle detected");
                    report.cycle_warning = Some(e.to_string());
                }
            }
        }

        Ok(documents)
    }

    /// Workspace-root aggregate: every declared package in declaration
    /// order, never compiled itself.
    async fn write_aggregate(&self, packages: &[PackageDescriptor], report: &mut RunReport) {
        let reference_paths: Vec<PathBuf> = packages
            .iter()
            .filter_map(|p| p.reference_path.clone())
            .collect();
        let aggregate = references::aggregate_document(&self.config.base_path, &reference_paths);
        let out_path = self.config.base_path.join(self.config.references_out());

        let outcome = match write_text(&out_path, aggregate.render()).await {
            Ok(()) => StepOutcome::Succeeded,
            Err(e) => {
                warn!(path = %out_path.display(), error = %e, "aggregate reference write failed");
                StepOutcome::Failed(e.to_string())
            }
        };
        report.aggregate = Some(outcome);
    }
}

async fn load_template(path: &Path) -> Result<Map<String, Value>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::TemplateNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    manifest::parse_template(&content, &path.display().to_string())
}

async fn scaffold_package(
    pkg: &PackageDescriptor,
    template: &Map<String, Value>,
) -> Result<ManifestDocument> {
    let document = manifest::synthesize(&pkg.name, &pkg.full_name, &pkg.overrides, template)?;
    tokio::fs::create_dir_all(&pkg.dir).await?;
    tokio::fs::write(pkg.manifest_path(), document.render()?)
        .await
        .map_err(|e| Error::ManifestWrite {
            package: pkg.name.clone(),
            message: e.to_string(),
        })?;
    Ok(document)
}

async fn pin_package(
    index: usize,
    pkg: PackageDescriptor,
    mut manifest: ManifestDocument,
    analyzer: Arc<dyn ModuleAnalyzer>,
    table: Arc<VersionTable>,
    targets: Arc<HashMap<String, (String, PathBuf)>>,
    prefix: RangePrefix,
) -> PinResult {
    let mut result = PinResult {
        index,
        analysis: StepOutcome::Skipped,
        manifest: StepOutcome::Skipped,
        reference: StepOutcome::Skipped,
        pinned: Vec::new(),
        unpinned: Vec::new(),
        edges: Vec::new(),
        document: ReferenceDocument::default(),
    };

    let deps = match analyzer.analyze(&pkg).await {
        Ok(deps) => deps,
        Err(e) => {
            // Scaffold-only manifest stays on disk; siblings are unaffected.
            warn!(package = %pkg.name, error = %e, "analysis failed");
            result.analysis = StepOutcome::Failed(e.to_string());
            return result;
        }
    };
    result.analysis = StepOutcome::Succeeded;

    for dep in deps {
        // A package never depends on itself.
        if dep == pkg.full_name {
            continue;
        }

        match pin_specifier(&table, &dep, prefix) {
            Some(specifier) => {
                manifest.set_dependency(&dep, &specifier);
                result.pinned.push(dep.clone());
            }
            None => {
                debug!(package = %pkg.name, dependency = %dep, "no version metadata");
                result.unpinned.push(dep.clone());
            }
        }

        // Reference entries accumulate in analyzer emission order, one per
        // dependency, only for other configured packages.
        if let (Some(own_ref), Some((dep_short, dep_ref))) =
            (&pkg.reference_path, targets.get(&dep))
        {
            if let Some(relative) = references::relative_reference(own_ref, dep_ref) {
                result.document.push(relative);
                result.edges.push((pkg.name.clone(), dep_short.clone()));
            }
        }
    }

    // Patch write supersedes the scaffold. Independent of the reference
    // write; either may fail without blocking siblings.
    result.manifest = match write_text(&pkg.manifest_path(), manifest.render()).await {
        Ok(()) => StepOutcome::Succeeded,
        Err(e) => {
            warn!(package = %pkg.name, error = %e, "manifest patch failed");
            StepOutcome::Failed(e.to_string())
        }
    };

    if let Some(own_ref) = &pkg.reference_path {
        if !result.document.references.is_empty() {
            result.reference = match write_text(own_ref, result.document.render()).await {
                Ok(()) => StepOutcome::Succeeded,
                Err(e) => {
                    warn!(package = %pkg.name, error = %e, "reference write failed");
                    StepOutcome::Failed(e.to_string())
                }
            };
        }
    }

    result
}

async fn write_text(path: &Path, rendered: Result<String>) -> Result<()> {
    let text = rendered?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text).await?;
    Ok(())
}

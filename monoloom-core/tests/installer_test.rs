use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;

use monoloom_core::analyzer::{ModuleAnalyzer, VersionMeta, VersionTable};
use monoloom_core::error::{Error, Result};
use monoloom_core::package::PackageDescriptor;
use monoloom_core::report::StepOutcome;
use monoloom_core::{Installer, WorkspaceConfig};

struct StubAnalyzer {
    deps: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    table: VersionTable,
}

impl StubAnalyzer {
    fn new() -> Self {
        Self {
            deps: HashMap::new(),
            failing: HashSet::new(),
            table: VersionTable::new(),
        }
    }

    fn with_deps(mut self, package: &str, deps: &[&str]) -> Self {
        self.deps
            .insert(package.to_string(), deps.iter().map(|s| s.to_string()).collect());
        self
    }

    fn with_failure(mut self, package: &str) -> Self {
        self.failing.insert(package.to_string());
        self
    }

    fn with_locked(mut self, name: &str, version: &str) -> Self {
        self.table.insert(name, VersionMeta::Locked(version.to_string()));
        self
    }

    fn with_suggested(mut self, name: &str, tag: &str) -> Self {
        self.table.insert(name, VersionMeta::Suggested(tag.to_string()));
        self
    }
}

#[async_trait]
impl ModuleAnalyzer for StubAnalyzer {
    async fn load_version_table(&self) -> Result<VersionTable> {
        Ok(self.table.clone())
    }

    async fn analyze(&self, package: &PackageDescriptor) -> Result<Vec<String>> {
        if self.failing.contains(&package.name) {
            return Err(Error::Analysis {
                package: package.name.clone(),
                message: "analysis blew up".to_string(),
            });
        }
        Ok(self.deps.get(&package.name).cloned().unwrap_or_default())
    }
}

fn write_workspace(dir: &Path, config: &str, template: Option<&str>) -> WorkspaceConfig {
    if let Some(template) = template {
        fs::write(dir.join("template.json"), template).unwrap();
    }
    let config_path = dir.join("packages.json");
    fs::write(&config_path, config).unwrap();
    WorkspaceConfig::load(&config_path).unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn install_pins_dependencies_and_writes_references() {
    let temp = TempDir::new().unwrap();
    let config = write_workspace(
        temp.path(),
        r#"{
            "basePath": ".",
            "scope": "@acme",
            "packageTemplate": "template.json",
            "tsconfigPaths": { "referencesIn": "tsconfig" },
            "packages": { "a": {}, "b": { "description": "b package" } }
        }"#,
        Some(r#"{ "version": "1.0.0", "license": "MIT", "main": "dist/$NAME.js" }"#),
    );

    let analyzer = StubAnalyzer::new()
        .with_deps("a", &[])
        .with_deps("b", &["@acme/b", "@acme/a", "lodash", "react"])
        .with_locked("@acme/a", "1.0.0")
        .with_locked("lodash", "4.17.21")
        .with_suggested("react", "latest");

    let outcome = Installer::new(config, Arc::new(analyzer))
        .install()
        .await
        .unwrap();

    let a_manifest = read_json(&temp.path().join("a/package.json"));
    assert_eq!(a_manifest["name"], "@acme/a");
    assert_eq!(a_manifest["license"], "MIT");
    assert_eq!(a_manifest["main"], "dist/a.js");
    assert!(a_manifest.get("dependencies").is_none());

    let b_manifest = read_json(&temp.path().join("b/package.json"));
    assert_eq!(b_manifest["description"], "b package");
    let deps = b_manifest["dependencies"].as_object().unwrap();
    assert_eq!(deps["@acme/a"], "~1.0.0");
    assert_eq!(deps["lodash"], "~4.17.21");
    assert_eq!(deps["react"], "latest");
    // A package never depends on itself.
    assert!(deps.get("@acme/b").is_none());

    // Only b has workspace-internal deps, so only b gets a document.
    assert!(!temp.path().join("a/tsconfig.json").exists());
    let b_refs = read_json(&temp.path().join("b/tsconfig.json"));
    assert_eq!(b_refs["references"][0]["path"], "../a/tsconfig.json");
    assert_eq!(b_refs["files"].as_array().unwrap().len(), 0);

    // Root aggregate: every declared package in declaration order.
    let root = read_json(&temp.path().join("tsconfig.json"));
    assert_eq!(root["references"][0]["path"], "a/tsconfig.json");
    assert_eq!(root["references"][1]["path"], "b/tsconfig.json");
    assert_eq!(root["files"].as_array().unwrap().len(), 0);

    let order = outcome.report.build_order.unwrap();
    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert!(pos("a") < pos("b"));

    #[cfg(unix)]
    {
        let meta = fs::symlink_metadata(temp.path().join("node_modules")).unwrap();
        assert!(meta.file_type().is_symlink());
        let meta = fs::symlink_metadata(temp.path().join("@acme")).unwrap();
        assert!(meta.file_type().is_symlink());
    }
}

#[tokio::test]
async fn analysis_failure_is_isolated_per_package() {
    let temp = TempDir::new().unwrap();
    let config = write_workspace(
        temp.path(),
        r#"{
            "basePath": ".",
            "packageTemplate": "template.json",
            "tsconfigPaths": { "referencesIn": "tsconfig" },
            "packages": { "x": {}, "y": {}, "z": {} }
        }"#,
        Some(r#"{ "version": "0.1.0" }"#),
    );

    let analyzer = StubAnalyzer::new()
        .with_failure("x")
        .with_deps("y", &["z"])
        .with_deps("z", &[])
        .with_locked("z", "0.1.0");

    let outcome = Installer::new(config, Arc::new(analyzer))
        .install()
        .await
        .unwrap();

    // x keeps its scaffold manifest, nothing more.
    let x_manifest = read_json(&temp.path().join("x/package.json"));
    assert_eq!(x_manifest["version"], "0.1.0");
    assert!(x_manifest.get("dependencies").is_none());
    assert!(!temp.path().join("x/tsconfig.json").exists());

    let reports: HashMap<_, _> = outcome
        .report
        .packages
        .iter()
        .map(|p| (p.name.as_str(), p))
        .collect();
    assert!(reports["x"].analysis.is_failed());
    assert_eq!(reports["x"].manifest, StepOutcome::Skipped);
    assert_eq!(reports["y"].manifest, StepOutcome::Succeeded);
    assert_eq!(reports["z"].manifest, StepOutcome::Succeeded);

    // y still got its pin and reference document.
    let y_manifest = read_json(&temp.path().join("y/package.json"));
    assert_eq!(y_manifest["dependencies"]["z"], "~0.1.0");
    let y_refs = read_json(&temp.path().join("y/tsconfig.json"));
    assert_eq!(y_refs["references"][0]["path"], "../z/tsconfig.json");
}

#[tokio::test]
async fn missing_template_means_unmanaged_manifests() {
    let temp = TempDir::new().unwrap();
    let config = write_workspace(
        temp.path(),
        r#"{
            "basePath": ".",
            "tsconfigPaths": { "referencesIn": "tsconfig" },
            "packages": { "a": {}, "b": {} }
        }"#,
        None,
    );

    let outcome = Installer::new(config, Arc::new(StubAnalyzer::new()))
        .install()
        .await
        .unwrap();

    assert!(!temp.path().join("a/package.json").exists());
    assert!(!temp.path().join("b/package.json").exists());
    for pkg in &outcome.report.packages {
        assert_eq!(pkg.scaffold, StepOutcome::Skipped);
        assert_eq!(pkg.manifest, StepOutcome::Skipped);
    }

    // The aggregate is still synthesized; it is plain fan-out.
    assert_eq!(outcome.report.aggregate, Some(StepOutcome::Succeeded));
    let root = read_json(&temp.path().join("tsconfig.json"));
    assert_eq!(root["references"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_dependency_is_reported_not_pinned() {
    let temp = TempDir::new().unwrap();
    let config = write_workspace(
        temp.path(),
        r#"{
            "basePath": ".",
            "packageTemplate": "template.json",
            "packages": { "a": {} }
        }"#,
        Some(r#"{ "version": "0.1.0" }"#),
    );

    let analyzer = StubAnalyzer::new().with_deps("a", &["ghost"]);
    let outcome = Installer::new(config, Arc::new(analyzer))
        .install()
        .await
        .unwrap();

    let a_manifest = read_json(&temp.path().join("a/package.json"));
    assert!(a_manifest.get("dependencies").is_none());
    assert_eq!(outcome.report.packages[0].unpinned, vec!["ghost".to_string()]);
}

#[tokio::test]
async fn second_run_survives_existing_links() {
    let temp = TempDir::new().unwrap();
    let config = write_workspace(
        temp.path(),
        r#"{
            "basePath": ".",
            "packageTemplate": "template.json",
            "packages": { "a": {} }
        }"#,
        Some(r#"{ "version": "0.1.0" }"#),
    );

    let installer = Installer::new(config, Arc::new(StubAnalyzer::new().with_deps("a", &[])));
    installer.install().await.unwrap();
    let second = installer.install().await.unwrap();

    // Alias creation fails the second time; the install carries on.
    let failed_links = second
        .report
        .links
        .iter()
        .filter(|l| l.outcome.is_failed())
        .count();
    assert!(failed_links > 0);
    assert_eq!(second.report.packages[0].manifest, StepOutcome::Succeeded);
}

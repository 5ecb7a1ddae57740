use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn install_command_end_to_end() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(
        &root.join("packages.json"),
        r#"{
            "basePath": ".",
            "scope": "@acme",
            "packageTemplate": "template.json",
            "tsconfigPaths": { "referencesIn": "tsconfig" },
            "packages": { "a": {}, "b": {} }
        }"#,
    );
    write(&root.join("template.json"), r#"{ "version": "1.0.0" }"#);
    write(&root.join("a/src/index.ts"), r#"import { b } from "@acme/b";"#);
    write(&root.join("b/src/index.ts"), "export const b = 1;\n");

    let output = Command::new(env!("CARGO_BIN_EXE_monoloom"))
        .arg("install")
        .arg(root.join("packages.json"))
        .output()
        .expect("Failed to execute monoloom install");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Installing workspace"));

    // Scaffold fields plus the pinned workspace dependency.
    let a_manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("a/package.json")).unwrap()).unwrap();
    assert_eq!(a_manifest["name"], "@acme/a");
    assert_eq!(a_manifest["dependencies"]["@acme/b"], "~1.0.0");

    let a_refs: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("a/tsconfig.json")).unwrap()).unwrap();
    assert_eq!(a_refs["references"][0]["path"], "../b/tsconfig.json");

    let aggregate: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("tsconfig.json")).unwrap()).unwrap();
    assert_eq!(aggregate["references"].as_array().unwrap().len(), 2);
    assert_eq!(aggregate["files"].as_array().unwrap().len(), 0);
}

#[test]
fn install_with_missing_config_fails() {
    let temp = TempDir::new().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_monoloom"))
        .arg("install")
        .arg(temp.path().join("packages.json"))
        .output()
        .expect("Failed to execute monoloom install");

    assert!(!output.status.success());
}

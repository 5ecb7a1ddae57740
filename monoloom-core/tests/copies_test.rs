use std::fs;

use tempfile::TempDir;

use monoloom_core::config::WorkspaceConfig;
use monoloom_core::copies::{copy_one, expand_copies};

fn config_with_copies(temp: &TempDir, copy_files: &str) -> WorkspaceConfig {
    let config_path = temp.path().join("packages.json");
    fs::write(
        &config_path,
        format!(
            r#"{{
                "basePath": ".",
                "copyFiles": {},
                "packages": {{ "a": {{}}, "b": {{}} }}
            }}"#,
            copy_files
        ),
    )
    .unwrap();
    WorkspaceConfig::load(&config_path).unwrap()
}

#[test]
fn placeholder_entries_fan_out_per_package() {
    let temp = TempDir::new().unwrap();
    let config = config_with_copies(&temp, r#"{ "$NAME/LICENSE": "LICENSE" }"#);

    let plans = expand_copies(&config);
    let targets: Vec<_> = plans
        .iter()
        .map(|p| p.target.strip_prefix(&config.base_path).unwrap().to_path_buf())
        .collect();
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0], std::path::Path::new("a/LICENSE"));
    assert_eq!(targets[1], std::path::Path::new("b/LICENSE"));
}

#[test]
fn literal_entries_copy_once() {
    let temp = TempDir::new().unwrap();
    let config = config_with_copies(&temp, r#"{ "docs/README.md": "README.md" }"#);
    assert_eq!(expand_copies(&config).len(), 1);
}

#[tokio::test]
async fn copy_creates_target_parents() {
    let temp = TempDir::new().unwrap();
    let config = config_with_copies(&temp, r#"{ "$NAME/LICENSE": "LICENSE" }"#);
    fs::write(temp.path().join("LICENSE"), "MIT").unwrap();

    for plan in expand_copies(&config) {
        copy_one(&plan).await.unwrap();
    }

    assert_eq!(fs::read_to_string(temp.path().join("a/LICENSE")).unwrap(), "MIT");
    assert_eq!(fs::read_to_string(temp.path().join("b/LICENSE")).unwrap(), "MIT");
}

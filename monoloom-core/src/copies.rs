//! Static file fan-out from the `copyFiles` config map.

use std::path::PathBuf;

use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};
use crate::manifest::NAME_PLACEHOLDER;

/// One planned copy, paths already resolved against the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Expands the `copyFiles` map into concrete copy plans. Entries containing
/// the name placeholder fan out once per declared package; entries without
/// it copy a single time.
pub fn expand_copies(config: &WorkspaceConfig) -> Vec<CopyPlan> {
    let mut plans = Vec::new();

    for (target, source) in &config.copy_files {
        if target.contains(NAME_PLACEHOLDER) || source.contains(NAME_PLACEHOLDER) {
            for name in config.packages.keys() {
                plans.push(CopyPlan {
                    source: config
                        .base_path
                        .join(source.replace(NAME_PLACEHOLDER, name)),
                    target: config
                        .base_path
                        .join(target.replace(NAME_PLACEHOLDER, name)),
                });
            }
        } else {
            plans.push(CopyPlan {
                source: config.base_path.join(source),
                target: config.base_path.join(target),
            });
        }
    }

    plans
}

/// Performs one copy, creating the target's parent directory if needed.
pub async fn copy_one(plan: &CopyPlan) -> Result<()> {
    if let Some(parent) = plan.target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(&plan.source, &plan.target)
        .await
        .map(|_| ())
        .map_err(Error::Io)
}

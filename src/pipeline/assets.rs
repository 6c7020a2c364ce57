// src/pipeline/assets.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::model::AssetsSection;
use crate::errors;
use crate::graph::{Action, ActionOutcome};
use crate::watch::FileSet;

/// Action that copies static files byte-for-byte under the destination
/// directory.
///
/// Each file keeps its path relative to the literal base of the pattern
/// that matched it, so `static/css/site.css` (pattern `static/**/*`) lands
/// at `dest/css/site.css`. Missing target directories are created; a file
/// that fails to copy does not stop the rest of the batch.
pub struct CopyAssetsAction {
    fileset: FileSet,
    dest: PathBuf,
}

impl CopyAssetsAction {
    /// Build the action from the `[build.assets]` config, with all paths
    /// anchored at the project root.
    pub fn from_config(assets: &AssetsSection, dest: &str, root: &Path) -> errors::Result<Self> {
        let fileset = FileSet::new(root, assets.sources.clone(), assets.exclude.clone())?;
        Ok(Self {
            fileset,
            dest: root.join(dest),
        })
    }

    async fn run_inner(&self) -> ActionOutcome {
        let files = match self.fileset.resolve_with_structure() {
            Ok(files) => files,
            Err(err) => return ActionOutcome::Failure(format!("resolving assets: {err:#}")),
        };

        if files.is_empty() {
            info!("no static assets matched, nothing to copy");
            return ActionOutcome::Success;
        }

        let mut failures: Vec<String> = Vec::new();
        let mut copied = 0usize;

        for (source, rel) in &files {
            let target = self.dest.join(rel);
            match copy_one(source, &target).await {
                Ok(()) => {
                    debug!(
                        source = %source.display(),
                        target = %target.display(),
                        "asset copied"
                    );
                    copied += 1;
                }
                Err(err) => {
                    warn!(
                        source = %source.display(),
                        error = %format!("{err:#}"),
                        "asset copy failed, continuing with remaining files"
                    );
                    failures.push(format!("{}: {err:#}", rel.display()));
                }
            }
        }

        if failures.is_empty() {
            info!(copied, "assets copied");
            ActionOutcome::Success
        } else {
            ActionOutcome::Failure(format!(
                "{} of {} assets failed to copy: {}",
                failures.len(),
                files.len(),
                failures.join("; ")
            ))
        }
    }
}

impl Action for CopyAssetsAction {
    fn run(&self) -> Pin<Box<dyn Future<Output = ActionOutcome> + Send + '_>> {
        Box::pin(self.run_inner())
    }
}

async fn copy_one(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating directory {:?}", parent))?;
    }
    tokio::fs::copy(source, target)
        .await
        .with_context(|| format!("copying {:?} to {:?}", source, target))?;
    Ok(())
}

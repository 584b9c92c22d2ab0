//! Workstation setup: install the connection shortcut blocks.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{BlockInstaller, ProgressReporter};
use crate::domain::{ConfigBlock, InstallOutcome};

/// What happened to one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockResult {
    pub path: PathBuf,
    pub marker: String,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

/// Install each block unless its marker is already present.
///
/// # Errors
///
/// Returns an error naming the file whose backup or append failed. Blocks
/// before it stay installed.
pub fn run(
    installer: &impl BlockInstaller,
    reporter: &impl ProgressReporter,
    blocks: &[ConfigBlock],
) -> Result<Vec<BlockResult>> {
    let mut results = Vec::with_capacity(blocks.len());
    for block in blocks {
        let path = block.path.display();
        let outcome = installer
            .install(block)
            .with_context(|| format!("installing block into {path}"))?;
        let result = match outcome {
            InstallOutcome::AlreadyInstalled => {
                reporter.info(&format!("{path}: already configured"));
                BlockResult {
                    path: block.path.clone(),
                    marker: block.start_marker.clone(),
                    installed: false,
                    backup: None,
                }
            }
            InstallOutcome::Installed { backup } => {
                match &backup {
                    Some(b) => {
                        reporter.success(&format!("{path}: updated (backup at {})", b.display()));
                    }
                    None => reporter.success(&format!("{path}: created")),
                }
                BlockResult {
                    path: block.path.clone(),
                    marker: block.start_marker.clone(),
                    installed: true,
                    backup,
                }
            }
        };
        results.push(result);
    }
    Ok(results)
}

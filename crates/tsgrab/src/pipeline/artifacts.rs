// Scoped ownership of intermediate files (segment payloads, assembled container).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// When intermediate files survive a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum RetentionPolicy {
    /// Always delete, success or failure
    #[default]
    Never,
    /// Keep them when a stage fails, for inspection
    OnFailure,
    /// Keep everything
    Always,
}

impl RetentionPolicy {
    pub fn retains(&self, succeeded: bool) -> bool {
        match self {
            RetentionPolicy::Never => false,
            RetentionPolicy::OnFailure => !succeeded,
            RetentionPolicy::Always => true,
        }
    }
}

/// Tracks intermediate paths and removes them once the run is settled, unless
/// the retention policy says otherwise. A guard dropped without being settled
/// counts as a failed run and cleans up synchronously.
#[derive(Debug)]
pub struct IntermediateArtifacts {
    policy: RetentionPolicy,
    paths: Vec<PathBuf>,
    settled: bool,
}

impl IntermediateArtifacts {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            paths: Vec::new(),
            settled: false,
        }
    }

    /// Register a file or directory. Directories are removed recursively.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Apply the retention policy for a run that succeeded or failed.
    /// Returns the paths that were kept.
    pub async fn settle(mut self, succeeded: bool) -> Vec<PathBuf> {
        let (kept, doomed) = self.drain(succeeded);
        // Newest first so files go before the directories holding them.
        for path in doomed.iter().rev() {
            log_removal(path, remove_path(path).await);
        }
        kept
    }

    /// Split tracked paths into (kept, to remove) and mark the guard settled.
    fn drain(&mut self, succeeded: bool) -> (Vec<PathBuf>, Vec<PathBuf>) {
        self.settled = true;
        let paths = std::mem::take(&mut self.paths);
        if self.policy.retains(succeeded) {
            if !paths.is_empty() {
                info!(count = paths.len(), policy = ?self.policy, "Keeping intermediate files");
            }
            (paths, Vec::new())
        } else {
            (Vec::new(), paths)
        }
    }
}

impl Drop for IntermediateArtifacts {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let (_, doomed) = self.drain(false);
        for path in doomed.iter().rev() {
            log_removal(path, remove_path_blocking(path));
        }
    }
}

async fn remove_path(path: &Path) -> std::io::Result<()> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path).await,
        Ok(_) => tokio::fs::remove_file(path).await,
        Err(e) => Err(e),
    }
}

fn remove_path_blocking(path: &Path) -> std::io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) => Err(e),
    }
}

fn log_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => debug!(path = %path.display(), "Removed intermediate file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove intermediate file"),
    }
}

use std::path::{Path, PathBuf};

use crate::pipeline::RetentionPolicy;
use crate::transcode::OutputFormat;

/// Default directory for final artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "downloaded_audio";

/// Options for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Where the final artifact is written
    pub output_dir: PathBuf,

    /// Where intermediate files go. Defaults to `output_dir`.
    pub work_dir: Option<PathBuf>,

    /// Max concurrent segment downloads
    pub download_concurrency: usize,

    pub output_format: OutputFormat,

    pub retention: RetentionPolicy,

    /// Overrides the name derived from the manifest URL
    pub base_name: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            work_dir: None,
            download_concurrency: 4,
            output_format: OutputFormat::default(),
            retention: RetentionPolicy::default(),
            base_name: None,
        }
    }
}

impl PipelineConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.as_deref().unwrap_or(&self.output_dir)
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    pub fn with_download_concurrency(mut self, concurrency: usize) -> Self {
        self.download_concurrency = concurrency.max(1);
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = Some(base_name.into());
        self
    }
}

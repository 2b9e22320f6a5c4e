use std::path::PathBuf;

use url::Url;

use crate::hls::{AssemblyError, FetchError, ManifestError, ScheduleError};
use crate::pipeline::PipelineStage;
use crate::transcode::TranscodeError;

/// Terminal failure of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid manifest URL '{url}': {reason}")]
    InvalidManifestUrl { url: String, reason: String },

    #[error("Failed to fetch manifest: {0}")]
    ManifestFetch(#[source] FetchError),

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(#[from] ManifestError),

    #[error("Manifest {url} lists no segments")]
    EmptyManifest { url: Url },

    #[error("Failed to prepare work directory {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch segment {index} ({url}): {source}")]
    SegmentFetch {
        index: usize,
        url: Url,
        #[source]
        source: FetchError,
    },

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Pipeline cancelled while {stage}")]
    Cancelled { stage: PipelineStage },
}

impl PipelineError {
    /// The stage the run was in when it failed
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::InvalidManifestUrl { .. }
            | PipelineError::ManifestFetch(_)
            | PipelineError::ManifestParse(_)
            | PipelineError::EmptyManifest { .. } => PipelineStage::FetchingManifest,
            PipelineError::Workspace { .. } | PipelineError::SegmentFetch { .. } => {
                PipelineStage::DownloadingSegments
            }
            PipelineError::Assembly(_) => PipelineStage::Assembling,
            PipelineError::Transcode(_) => PipelineStage::Transcoding,
            PipelineError::Cancelled { stage } => *stage,
        }
    }

    /// The underlying fetch failure, for network errors
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            PipelineError::ManifestFetch(e) | PipelineError::SegmentFetch { source: e, .. } => {
                Some(e)
            }
            _ => None,
        }
    }
}

impl From<ScheduleError> for PipelineError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Segment { index, url, source } => {
                PipelineError::SegmentFetch { index, url, source }
            }
            ScheduleError::Cancelled => PipelineError::Cancelled {
                stage: PipelineStage::DownloadingSegments,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_follow_taxonomy() {
        let empty = PipelineError::EmptyManifest {
            url: Url::parse("https://host/dir/index.m3u8").unwrap(),
        };
        assert_eq!(empty.stage(), PipelineStage::FetchingManifest);

        let transcode = PipelineError::Transcode(TranscodeError::Failed {
            tool: "ffmpeg".into(),
            status: "exit status: 1".into(),
            diagnostic: "boom".into(),
        });
        assert_eq!(transcode.stage(), PipelineStage::Transcoding);
        assert!(transcode.to_string().contains("boom"));

        let cancelled = PipelineError::Cancelled {
            stage: PipelineStage::Assembling,
        };
        assert_eq!(cancelled.stage(), PipelineStage::Assembling);
    }
}

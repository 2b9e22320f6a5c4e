//! Transcoding port.
//!
//! The pipeline hands the assembled container to a [`Transcoder`] and treats it
//! as a black box: success, or a failure carrying the engine's own diagnostic
//! text. [`FfmpegTranscoder`] is the production implementation.

mod ffmpeg;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use ffmpeg::FfmpegTranscoder;

/// Bitrate requested from the transcoder, in kbit/s.
pub const DEFAULT_BITRATE_KBPS: u32 = 192;

/// Target audio encoding of the final artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp3,
    Aac,
    Opus,
}

impl OutputFormat {
    /// Encoder name passed to ffmpeg
    pub fn codec(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Aac => "aac",
            OutputFormat::Opus => "libopus",
        }
    }

    /// Muxer name passed to ffmpeg
    pub fn container(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Aac => "adts",
            OutputFormat::Opus => "ogg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Aac => "aac",
            OutputFormat::Opus => "opus",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "audio/mpeg",
            OutputFormat::Aac => "audio/aac",
            OutputFormat::Opus => "audio/ogg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub bitrate_kbps: u32,
    /// Replace an existing file at `output`
    pub overwrite: bool,
}

impl TranscodeRequest {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        format: OutputFormat,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            format,
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
            overwrite: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("{tool} not found; is it installed and in PATH?")]
    ToolNotFound { tool: String },
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {diagnostic}")]
    Failed {
        tool: String,
        status: String,
        /// Captured error output of the engine, untouched
        diagnostic: String,
    },
    #[error("{tool} timed out after {timeout:?}")]
    Timeout { tool: String, timeout: Duration },
    #[error("output {} already exists", path.display())]
    OutputExists { path: PathBuf },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// The engine's diagnostic output, when the engine ran and failed
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            TranscodeError::Failed { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Short engine name for logs
    fn name(&self) -> &str;

    async fn transcode(&self, request: &TranscodeRequest) -> Result<(), TranscodeError>;
}

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{TranscodeError, TranscodeRequest, Transcoder};

const FFMPEG: &str = "ffmpeg";

/// Runs the `ffmpeg` executable as a child process.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Use `explicit` when it exists, otherwise look `ffmpeg` up on `PATH`.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, TranscodeError> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Self::new(path));
            }
            warn!(path = %path.display(), "Configured ffmpeg not found, falling back to PATH");
        }

        which::which(FFMPEG)
            .map(Self::new)
            .map_err(|_| TranscodeError::ToolNotFound {
                tool: FFMPEG.to_string(),
            })
    }

    /// Kill the process if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn build_args(request: &TranscodeRequest) -> Vec<String> {
        let format = request.format;
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            if request.overwrite { "-y" } else { "-n" }.to_string(),
            "-i".to_string(),
            request.input.to_string_lossy().into_owned(),
            "-vn".to_string(),
            "-f".to_string(),
            format.container().to_string(),
            "-c:a".to_string(),
            format.codec().to_string(),
            "-b:a".to_string(),
            format!("{}k", request.bitrate_kbps),
            request.output.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        FFMPEG
    }

    async fn transcode(&self, request: &TranscodeRequest) -> Result<(), TranscodeError> {
        if !request.overwrite && tokio::fs::try_exists(&request.output).await? {
            return Err(TranscodeError::OutputExists {
                path: request.output.clone(),
            });
        }

        let args = Self::build_args(request);
        debug!(program = %self.program.display(), ?args, "Spawning ffmpeg");

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranscodeError::Spawn {
                tool: FFMPEG.to_string(),
                source,
            })?;

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| TranscodeError::Timeout {
                    tool: FFMPEG.to_string(),
                    timeout,
                })??,
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                tool: FFMPEG.to_string(),
                status: output.status.to_string(),
                diagnostic: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        info!(
            input = %request.input.display(),
            output = %request.output.display(),
            format = %request.format,
            bitrate_kbps = request.bitrate_kbps,
            "Transcoded container"
        );
        Ok(())
    }
}

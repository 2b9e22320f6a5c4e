// Pipeline orchestrator: sequences fetch, parse, download, assemble and transcode,
// and owns every intermediate file produced along the way.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::auth::AuthContext;
use crate::config::DownloaderConfig;
use crate::error::PipelineError;
use crate::hls::{
    AssembledContainer, FetchError, HttpFetcher, ResourceFetcher, SegmentAssembler, SegmentRef,
    SegmentScheduler, parse_manifest,
};
use crate::pipeline::{
    IntermediateArtifacts, OnEvent, PipelineConfig, PipelineEvent, PipelineStage, PipelineState,
    derive_base_name, normalize_base_name,
};
use crate::transcode::{OutputFormat, TranscodeRequest, Transcoder};

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub manifest_url: String,
    pub base_name: String,
    /// The transcoded file
    pub artifact: PathBuf,
    pub format: OutputFormat,
    pub mime_type: &'static str,
    pub segment_count: usize,
    pub container_bytes: u64,
    /// Intermediate files kept by the retention policy
    pub retained: Vec<PathBuf>,
    pub elapsed: Duration,
}

pub type PipelineResult = Result<PipelineOutput, PipelineError>;

/// Cancels the run in progress, or the next one when no run is active.
///
/// A cancellation ends exactly one run; the pipeline arms a fresh token
/// afterwards so the same instance can run again.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    current: Arc<Mutex<CancellationToken>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token().is_cancelled()
    }

    fn token(&self) -> CancellationToken {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn rearm(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.is_cancelled() {
            *current = CancellationToken::new();
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Arc<dyn ResourceFetcher>,
    transcoder: Arc<dyn Transcoder>,
    on_event: Option<OnEvent>,
    cancel: CancelHandle,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        fetcher: Arc<dyn ResourceFetcher>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            config,
            fetcher,
            transcoder,
            on_event: None,
            cancel: CancelHandle::default(),
            state: PipelineState::Idle,
        }
    }

    /// Build a pipeline fetching over HTTP with the given request context.
    pub fn with_http(
        config: PipelineConfig,
        downloader_config: &DownloaderConfig,
        auth: AuthContext,
        transcoder: Arc<dyn Transcoder>,
    ) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::from_config(downloader_config, auth)?;
        Ok(Self::new(config, Arc::new(fetcher), transcoder))
    }

    pub fn with_observer(mut self, on_event: OnEvent) -> Self {
        self.on_event = Some(on_event);
        self
    }

    /// Cancelling through this handle aborts the current run at its next await point.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(event);
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        let from = std::mem::replace(&mut self.state, next.clone());
        debug!(%from, to = %next, "Pipeline state changed");
        self.emit(PipelineEvent::StateChanged { from, to: next });
    }

    /// Run the pipeline for one manifest. Every run starts from `Idle`.
    pub async fn run(&mut self, manifest_url: &str) -> PipelineResult {
        self.state = PipelineState::Idle;
        let started = Instant::now();

        let cancel = self.cancel.token();
        let result = self.execute(manifest_url, started, &cancel).await;
        self.cancel.rearm();
        match &result {
            Ok(output) => {
                self.transition(PipelineState::Ready);
                info!(
                    url = %manifest_url,
                    artifact = %output.artifact.display(),
                    segments = output.segment_count,
                    duration = ?output.elapsed,
                    "Pipeline complete"
                );
            }
            Err(e) => {
                error!(url = %manifest_url, stage = %e.stage(), error = %e, "Pipeline failed");
                self.transition(PipelineState::Failed {
                    stage: e.stage(),
                    cause: e.to_string(),
                });
            }
        }
        result
    }

    async fn execute(
        &mut self,
        manifest_url: &str,
        started: Instant,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        self.transition(PipelineState::FetchingManifest);

        let source = Url::parse(manifest_url).map_err(|e| PipelineError::InvalidManifestUrl {
            url: manifest_url.to_string(),
            reason: e.to_string(),
        })?;
        info!(url = %source, "Fetching manifest");

        let fetcher = Arc::clone(&self.fetcher);
        let body = cancellable(cancel, PipelineStage::FetchingManifest, async {
            fetcher
                .fetch_bytes(&source)
                .await
                .map_err(PipelineError::ManifestFetch)
        })
        .await?;
        let text = String::from_utf8_lossy(&body);
        let manifest = parse_manifest(&text, &source)?;
        if manifest.is_empty() {
            return Err(PipelineError::EmptyManifest { url: source });
        }
        info!(segments = manifest.len(), "Manifest parsed");
        self.emit(PipelineEvent::ManifestParsed {
            url: source.clone(),
            segments: manifest.len(),
        });

        let base_name = match &self.config.base_name {
            Some(requested) => {
                let name = normalize_base_name(requested);
                if name != *requested {
                    warn!(%requested, using = %name, "Base name adjusted to a safe file name");
                }
                name
            }
            None => derive_base_name(&source),
        };

        self.transition(PipelineState::DownloadingSegments);

        let output_dir = self.config.output_dir.clone();
        let parts_dir = self.config.work_dir().join(format!("{base_name}.parts"));
        create_dir(&output_dir).await?;
        let mut artifacts = IntermediateArtifacts::new(self.config.retention);
        create_dir(&parts_dir).await?;
        artifacts.track(&parts_dir);

        let produced = self
            .produce(&manifest.segments, &base_name, &parts_dir, &output_dir, cancel)
            .await;
        let retained = artifacts.settle(produced.is_ok()).await;
        let (container, artifact) = produced?;

        let format = self.config.output_format;
        Ok(PipelineOutput {
            manifest_url: source.to_string(),
            base_name,
            artifact,
            format,
            mime_type: format.mime_type(),
            segment_count: container.segment_count,
            container_bytes: container.size,
            retained,
            elapsed: started.elapsed(),
        })
    }

    /// Download, assemble and transcode. Returns the container and the artifact path.
    async fn produce(
        &mut self,
        segments: &[SegmentRef],
        base_name: &str,
        parts_dir: &Path,
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<(AssembledContainer, PathBuf), PipelineError> {
        let on_event = self.on_event.clone();
        let scheduler = SegmentScheduler::new(
            Arc::clone(&self.fetcher),
            self.config.download_concurrency,
        )
        .with_cancellation(cancel.child_token());
        let retrieved = scheduler
            .download_all(segments, parts_dir, |progress| {
                debug!(
                    index = progress.index,
                    completed = progress.completed,
                    total = progress.total,
                    "Segment downloaded"
                );
                if let Some(on_event) = &on_event {
                    on_event(PipelineEvent::SegmentDownloaded(progress));
                }
            })
            .await?;

        self.transition(PipelineState::Assembling);

        let container_path = parts_dir.join(format!("{base_name}.ts"));
        let container = cancellable(cancel, PipelineStage::Assembling, async {
            SegmentAssembler::new()
                .assemble(&retrieved, &container_path)
                .await
                .map_err(PipelineError::from)
        })
        .await?;
        self.emit(PipelineEvent::Assembled {
            path: container.path.clone(),
            bytes: container.size,
        });

        self.transition(PipelineState::Transcoding);

        let format = self.config.output_format;
        let artifact = output_dir.join(format!("{base_name}.{}", format.extension()));
        let request = TranscodeRequest::new(&container.path, &artifact, format);
        // An inconclusive check counts as existing so a failure never deletes it.
        let artifact_existed = tokio::fs::try_exists(&artifact).await.unwrap_or(true);
        info!(
            transcoder = self.transcoder.name(),
            output = %artifact.display(),
            %format,
            "Transcoding container"
        );

        let transcoder = Arc::clone(&self.transcoder);
        let transcoded = cancellable(cancel, PipelineStage::Transcoding, async {
            transcoder
                .transcode(&request)
                .await
                .map_err(PipelineError::from)
        })
        .await;
        if let Err(e) = transcoded {
            if !artifact_existed {
                discard_partial(&artifact).await;
            }
            return Err(e);
        }

        Ok((container, artifact))
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    stage: PipelineStage,
    fut: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled { stage }),
        result = fut => result,
    }
}

async fn create_dir(path: &Path) -> Result<(), PipelineError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| PipelineError::Workspace {
            path: path.to_path_buf(),
            source,
        })
}

async fn discard_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}

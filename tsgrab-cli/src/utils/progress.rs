use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tsgrab_engine::{PipelineEvent, PipelineState};

fn segment_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {msg}\n[{elapsed_precise}] [{bar:40.green/white}] {pos}/{len} segments")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn stage_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} [{elapsed_precise}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Renders pipeline events as indicatif bars
#[derive(Clone)]
pub struct ProgressManager {
    multi: MultiProgress,
    bar: Arc<Mutex<Option<ProgressBar>>>,
    disabled: bool,
}

impl ProgressManager {
    pub fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            bar: Arc::new(Mutex::new(None)),
            disabled: false,
        }
    }

    pub fn new_disabled(multi: MultiProgress) -> Self {
        Self {
            multi,
            bar: Arc::new(Mutex::new(None)),
            disabled: true,
        }
    }

    fn replace(&self, slot: &mut Option<ProgressBar>, bar: ProgressBar) {
        if let Some(previous) = slot.take() {
            previous.finish_and_clear();
        }
        bar.enable_steady_tick(Duration::from_millis(200));
        *slot = Some(self.multi.add(bar));
    }

    pub fn handle_event(&self, event: PipelineEvent) {
        if self.disabled {
            return;
        }

        let Ok(mut slot) = self.bar.lock() else {
            return;
        };
        match event {
            PipelineEvent::ManifestParsed { segments, .. } => {
                let bar = ProgressBar::new(segments as u64);
                bar.set_style(segment_style());
                bar.set_message("Downloading segments");
                self.replace(&mut slot, bar);
            }
            PipelineEvent::SegmentDownloaded(progress) => {
                if let Some(bar) = slot.as_ref() {
                    bar.set_position(progress.completed as u64);
                }
            }
            PipelineEvent::StateChanged { to, .. } => match to {
                PipelineState::FetchingManifest
                | PipelineState::Assembling
                | PipelineState::Transcoding => {
                    let bar = ProgressBar::new_spinner();
                    bar.set_style(stage_style());
                    bar.set_message(to.to_string());
                    self.replace(&mut slot, bar);
                }
                PipelineState::Ready => {
                    if let Some(bar) = slot.take() {
                        bar.finish_with_message("Done");
                    }
                }
                PipelineState::Failed { stage, .. } => {
                    if let Some(bar) = slot.take() {
                        bar.abandon_with_message(format!("Failed while {stage}"));
                    }
                }
                PipelineState::Idle | PipelineState::DownloadingSegments => {}
            },
            PipelineEvent::Assembled { .. } => {}
        }
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::hls::SegmentProgress;
use crate::pipeline::PipelineState;

/// Something observable happened during a pipeline run.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The run moved to a new state. `Failed` carries the stage and cause.
    StateChanged {
        from: PipelineState,
        to: PipelineState,
    },
    ManifestParsed {
        url: Url,
        segments: usize,
    },
    /// One segment finished downloading. Emitted in completion order.
    SegmentDownloaded(SegmentProgress),
    Assembled {
        path: PathBuf,
        bytes: u64,
    },
}

/// A callback receiving pipeline events.
pub type OnEvent = Arc<dyn Fn(PipelineEvent) + Send + Sync>;

//! Pipeline orchestration: manifest -> segments -> container -> transcoded artifact.

mod artifacts;
mod config;
mod events;
mod naming;
mod orchestrator;
mod state;

pub use artifacts::{IntermediateArtifacts, RetentionPolicy};
pub use config::{DEFAULT_OUTPUT_DIR, PipelineConfig};
pub use events::{OnEvent, PipelineEvent};
pub use naming::{derive_base_name, normalize_base_name};
pub use orchestrator::{CancelHandle, Pipeline, PipelineOutput, PipelineResult};
pub use state::{PipelineStage, PipelineState};

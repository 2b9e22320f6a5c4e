use std::fmt;

use serde::Serialize;

/// A working stage of the pipeline, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    FetchingManifest,
    DownloadingSegments,
    Assembling,
    Transcoding,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineStage::FetchingManifest => "fetching manifest",
            PipelineStage::DownloadingSegments => "downloading segments",
            PipelineStage::Assembling => "assembling",
            PipelineStage::Transcoding => "transcoding",
        })
    }
}

/// Lifecycle of one pipeline run.
///
/// `Idle -> FetchingManifest -> DownloadingSegments -> Assembling -> Transcoding -> Ready`,
/// with a jump to `Failed` from any working stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    FetchingManifest,
    DownloadingSegments,
    Assembling,
    Transcoding,
    Ready,
    Failed { stage: PipelineStage, cause: String },
}

impl PipelineState {
    /// The working stage this state represents, if any
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            PipelineState::FetchingManifest => Some(PipelineStage::FetchingManifest),
            PipelineState::DownloadingSegments => Some(PipelineStage::DownloadingSegments),
            PipelineState::Assembling => Some(PipelineStage::Assembling),
            PipelineState::Transcoding => Some(PipelineStage::Transcoding),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Ready | PipelineState::Failed { .. })
    }

    fn rank(&self) -> u8 {
        match self {
            PipelineState::Idle => 0,
            PipelineState::FetchingManifest => 1,
            PipelineState::DownloadingSegments => 2,
            PipelineState::Assembling => 3,
            PipelineState::Transcoding => 4,
            PipelineState::Ready => 5,
            PipelineState::Failed { .. } => 6,
        }
    }

    /// Whether moving to `next` keeps the run strictly forward
    pub fn can_transition_to(&self, next: &PipelineState) -> bool {
        match (self, next) {
            (current, _) if current.is_terminal() => false,
            (PipelineState::Idle, PipelineState::Failed { .. }) => false,
            (current, PipelineState::Failed { stage, .. }) => current.stage() == Some(*stage),
            (current, next) => next.rank() == current.rank() + 1,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("idle"),
            PipelineState::Ready => f.write_str("ready"),
            PipelineState::Failed { stage, cause } => write!(f, "failed while {stage}: {cause}"),
            working => match working.stage() {
                Some(stage) => write!(f, "{stage}"),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_only() {
        use PipelineState::*;
        assert!(Idle.can_transition_to(&FetchingManifest));
        assert!(FetchingManifest.can_transition_to(&DownloadingSegments));
        assert!(Transcoding.can_transition_to(&Ready));
        assert!(!Idle.can_transition_to(&Assembling));
        assert!(!Assembling.can_transition_to(&DownloadingSegments));
        assert!(!Ready.can_transition_to(&Idle));
    }

    #[test]
    fn failure_must_name_current_stage() {
        let failed = |stage| PipelineState::Failed {
            stage,
            cause: "boom".to_string(),
        };
        assert!(
            PipelineState::DownloadingSegments
                .can_transition_to(&failed(PipelineStage::DownloadingSegments))
        );
        assert!(
            !PipelineState::DownloadingSegments
                .can_transition_to(&failed(PipelineStage::Transcoding))
        );
        assert!(!failed(PipelineStage::Assembling).can_transition_to(&PipelineState::Ready));
    }

    #[test]
    fn display() {
        assert_eq!(PipelineState::Assembling.to_string(), "assembling");
        let failed = PipelineState::Failed {
            stage: PipelineStage::FetchingManifest,
            cause: "HTTP 403".to_string(),
        };
        assert_eq!(failed.to_string(), "failed while fetching manifest: HTTP 403");
    }
}

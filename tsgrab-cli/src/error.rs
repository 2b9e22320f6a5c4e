use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Pipeline(#[from] tsgrab_engine::PipelineError),

    #[error("Download error: {0}")]
    Fetch(#[from] tsgrab_engine::FetchError),

    #[error("Transcoder error: {0}")]
    Transcoder(#[from] tsgrab_engine::TranscodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),
}

use std::path::PathBuf;

use reqwest::StatusCode;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}: {body}")]
    Status {
        url: Url,
        status: StatusCode,
        /// Response body, truncated
        body: String,
    },
    #[error("transfer failed for {url}: {source}")]
    Transfer {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Invalid proxy configuration: {0}")]
    Proxy(String),
}

impl FetchError {
    /// Status code of a non-success response, if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transfer { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Response body captured from a non-success response
    pub fn body(&self) -> Option<&str> {
        match self {
            FetchError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

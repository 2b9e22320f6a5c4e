// Segment Fetcher: a plain GET of one location with the shared request context.
// Used for the manifest and for every segment. No retries.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Client, Response};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthContext;
use crate::config::DownloaderConfig;
use crate::downloader::create_client;
use crate::hls::FetchError;

/// Longest response body kept for diagnostics.
const MAX_ERROR_BODY_BYTES: usize = 2048;

#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the whole body into memory
    async fn fetch_bytes(&self, url: &Url) -> Result<Bytes, FetchError>;

    /// Stream the body into `destination`, truncating it first.
    /// Returns the number of bytes written.
    async fn fetch_to_file(&self, url: &Url, destination: &Path) -> Result<u64, FetchError>;
}

pub struct HttpFetcher {
    http_client: Client,
    auth: Arc<AuthContext>,
}

impl HttpFetcher {
    pub fn new(http_client: Client, auth: Arc<AuthContext>) -> Self {
        Self { http_client, auth }
    }

    pub fn from_config(config: &DownloaderConfig, auth: AuthContext) -> Result<Self, FetchError> {
        let http_client = create_client(config)?;
        Ok(Self::new(http_client, Arc::new(auth)))
    }

    async fn send(&self, url: &Url) -> Result<Response, FetchError> {
        let request = self.auth.apply(self.http_client.get(url.clone()));
        let response = request
            .send()
            .await
            .map_err(|source| FetchError::Transfer {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(text) => truncate_body(text),
                Err(e) => {
                    debug!(%url, error = %e, "Could not read error response body");
                    String::new()
                }
            };
            warn!(%url, %status, "Request failed");
            return Err(FetchError::Status {
                url: url.clone(),
                status,
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &Url) -> Result<Bytes, FetchError> {
        let response = self.send(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transfer {
                url: url.clone(),
                source,
            })?;
        debug!(%url, bytes = bytes.len(), "Fetched resource");
        Ok(bytes)
    }

    async fn fetch_to_file(&self, url: &Url, destination: &Path) -> Result<u64, FetchError> {
        let response = self.send(url).await?;

        let io_error = |source| FetchError::Io {
            path: destination.to_path_buf(),
            source,
        };
        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(io_error)?;

        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| FetchError::Transfer {
                url: url.clone(),
                source,
            })?;
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;

        debug!(%url, path = %destination.display(), bytes = written, "Downloaded segment");
        Ok(written)
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY_BYTES {
        let mut cut = MAX_ERROR_BODY_BYTES;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

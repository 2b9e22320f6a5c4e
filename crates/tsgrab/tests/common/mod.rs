//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header::COOKIE};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tsgrab_engine::{
    AuthContext, DownloaderConfig, OnEvent, Pipeline, PipelineConfig, PipelineEvent,
    TranscodeError, TranscodeRequest, Transcoder,
};
use url::Url;

enum Resource {
    Complete(StatusCode, Bytes),
    /// Sends `Bytes`, then breaks the body stream
    Interrupted(Bytes),
}

#[derive(Default)]
struct Routes {
    resources: HashMap<String, Resource>,
    required_cookie: Option<String>,
    requests: Mutex<Vec<String>>,
}

/// Builder for the resources a [`TestHttpServer`] serves.
#[derive(Default)]
pub struct Fixture {
    routes: Routes,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with 200 at `path` (percent-encoded form).
    pub fn ok(self, path: &str, body: impl Into<Bytes>) -> Self {
        self.respond(path, StatusCode::OK, body)
    }

    pub fn respond(mut self, path: &str, status: StatusCode, body: impl Into<Bytes>) -> Self {
        self.routes
            .resources
            .insert(path.to_string(), Resource::Complete(status, body.into()));
        self
    }

    /// Answer 200 at `path` but fail the transfer after `partial`.
    pub fn interrupted(mut self, path: &str, partial: impl Into<Bytes>) -> Self {
        self.routes
            .resources
            .insert(path.to_string(), Resource::Interrupted(partial.into()));
        self
    }

    /// Reject every request without exactly this `Cookie` header.
    pub fn require_cookie(mut self, cookie: &str) -> Self {
        self.routes.required_cookie = Some(cookie.to_string());
        self
    }

    pub async fn serve(self) -> TestHttpServer {
        TestHttpServer::new(self.routes).await
    }
}

async fn handle(State(routes): State<Arc<Routes>>, uri: Uri, headers: HeaderMap) -> Response {
    let path = uri.path().to_string();
    routes.requests.lock().unwrap().push(path.clone());

    if let Some(expected) = &routes.required_cookie {
        let sent = headers.get(COOKIE).and_then(|v| v.to_str().ok());
        if sent != Some(expected.as_str()) {
            return (StatusCode::UNAUTHORIZED, "missing session").into_response();
        }
    }

    match routes.resources.get(&path) {
        Some(Resource::Complete(status, body)) => (*status, body.clone()).into_response(),
        Some(Resource::Interrupted(partial)) => {
            let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
                Ok(partial.clone()),
                Err(std::io::Error::other("connection reset")),
            ];
            Body::from_stream(futures::stream::iter(chunks)).into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Local HTTP server on a random port, shut down on drop.
pub struct TestHttpServer {
    base_url: Url,
    routes: Arc<Routes>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestHttpServer {
    async fn new(routes: Routes) -> Self {
        let routes = Arc::new(routes);
        let router = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&routes));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server = axum::serve(listener, router).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });
        tokio::spawn(async move {
            server.await.unwrap();
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}")).unwrap(),
            routes,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        self.base_url.join(path).unwrap().to_string()
    }

    /// Paths requested so far, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.routes.requests.lock().unwrap().clone()
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

/// Transcoder stand-in: records the container it was given and writes a
/// tagged copy to the output path, or fails with a fixed diagnostic.
#[derive(Default)]
pub struct RecordingTranscoder {
    inputs: Mutex<Vec<Vec<u8>>>,
    failure: Option<String>,
}

impl RecordingTranscoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(diagnostic: &str) -> Arc<Self> {
        Arc::new(Self {
            inputs: Mutex::default(),
            failure: Some(diagnostic.to_string()),
        })
    }

    pub fn inputs(&self) -> Vec<Vec<u8>> {
        self.inputs.lock().unwrap().clone()
    }
}

pub const ENCODED_TAG: &[u8] = b"ENC:";

#[async_trait]
impl Transcoder for RecordingTranscoder {
    fn name(&self) -> &str {
        "recording"
    }

    async fn transcode(&self, request: &TranscodeRequest) -> Result<(), TranscodeError> {
        let input = tokio::fs::read(&request.input).await?;
        self.inputs.lock().unwrap().push(input.clone());

        if let Some(diagnostic) = &self.failure {
            // Leave a partial file behind like a real encoder would.
            tokio::fs::write(&request.output, b"partial").await?;
            return Err(TranscodeError::Failed {
                tool: "recording".to_string(),
                status: "exit status: 1".to_string(),
                diagnostic: diagnostic.clone(),
            });
        }

        let mut encoded = ENCODED_TAG.to_vec();
        encoded.extend_from_slice(&input);
        tokio::fs::write(&request.output, encoded).await?;
        Ok(())
    }
}

pub fn downloader_config() -> DownloaderConfig {
    DownloaderConfig::builder().with_system_proxy(false).build()
}

/// Pipeline writing under `dir`, fetching with `auth`.
pub fn pipeline(
    dir: &Path,
    auth: AuthContext,
    transcoder: Arc<RecordingTranscoder>,
    config: impl FnOnce(PipelineConfig) -> PipelineConfig,
) -> Pipeline {
    let config = config(PipelineConfig::new(dir.join("out")).with_work_dir(dir.join("work")));
    Pipeline::with_http(config, &downloader_config(), auth, transcoder).unwrap()
}

/// Observer collecting every event into a shared list.
pub fn recorder() -> (OnEvent, Arc<Mutex<Vec<PipelineEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let on_event: OnEvent = Arc::new(move |event: PipelineEvent| sink.lock().unwrap().push(event));
    (on_event, events)
}

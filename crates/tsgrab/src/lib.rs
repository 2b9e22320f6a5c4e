//! # tsgrab
//!
//! Downloads a segmented audio stream described by an HLS-style manifest,
//! reassembles the segments into one transport-stream container and hands it
//! to a transcoder for the final audio file.
//!
//! ## Features
//!
//! - Relative and absolute segment locators
//! - Bounded concurrent segment downloads with manifest-order assembly
//! - Session cookie and browser header handling
//! - Pluggable [`Transcoder`] with an ffmpeg implementation
//! - Observable pipeline state and configurable intermediate file retention

pub mod auth;
pub mod builder;
pub mod config;
pub mod downloader;
pub mod error;
pub mod hls;
pub mod pipeline;
pub mod proxy;
pub mod transcode;

pub use auth::{AuthContext, DEFAULT_SESSION_COOKIE, SessionCredential};
pub use builder::DownloaderConfigBuilder;
pub use config::DownloaderConfig;
pub use error::PipelineError;

// Re-export downloader utilities
pub use downloader::create_client;
pub use hls::{FetchError, HttpFetcher, ResourceFetcher};

// Re-export pipeline types
pub use pipeline::{
    CancelHandle, OnEvent, Pipeline, PipelineConfig, PipelineEvent, PipelineOutput, PipelineResult,
    PipelineStage, PipelineState, RetentionPolicy,
};

// Re-export transcoding
pub use transcode::{FfmpegTranscoder, OutputFormat, TranscodeError, TranscodeRequest, Transcoder};

// Re-export proxy utilities
pub use proxy::{ProxyAuth, ProxyConfig, ProxyType};

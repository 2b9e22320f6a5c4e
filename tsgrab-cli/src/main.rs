use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indicatif::MultiProgress;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tsgrab_engine::pipeline::DEFAULT_OUTPUT_DIR;
use tsgrab_engine::{
    AuthContext, DownloaderConfig, FfmpegTranscoder, Pipeline, PipelineConfig, ProxyAuth,
    ProxyConfig, ProxyType, SessionCredential,
};

mod cli;
mod error;
mod utils;

use cli::CliArgs;
use error::AppError;
use utils::progress::ProgressManager;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("tsgrab.log")?;

    // Logs go to stderr so stdout only carries the result
    let multi_writer = MakeWriterExt::and(std::io::stderr, log_file);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(multi_writer)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    info!("tsgrab - segmented audio stream downloader, part of the rust-srec project by hua0512");
    info!("GitHub: https://github.com/hua0512/rust-srec");
    info!("==================================================================");

    // Handle proxy configuration
    let proxy_config = if args.no_proxy {
        info!("All proxy settings disabled (--no-proxy flag)");
        None
    } else if let Some(proxy_url) = args.proxy.as_ref() {
        let proxy_type = ProxyType::from_str(&args.proxy_type).map_err(AppError::InvalidInput)?;

        // Configure proxy authentication if both username and password are provided
        let auth = match (&args.proxy_user, &args.proxy_pass) {
            (Some(username), Some(password)) => Some(ProxyAuth {
                username: username.clone(),
                password: password.clone(),
            }),
            (None, None) => None,
            _ => {
                warn!("Proxy authentication needs both --proxy-user and --proxy-pass, ignoring");
                None
            }
        };

        info!(
            proxy_url = %proxy_url,
            proxy_type = ?proxy_type,
            has_auth = auth.is_some(),
            "Using explicit proxy configuration for downloads"
        );

        Some(ProxyConfig {
            url: proxy_url.clone(),
            proxy_type,
            auth,
        })
    } else {
        None
    };

    info!(
        "HTTP timeout configuration: overall={}s, connect={}s",
        args.timeout, args.connect_timeout
    );

    let download_config = {
        let mut builder = DownloaderConfig::builder()
            .with_timeout(Duration::from_secs(args.timeout))
            .with_connect_timeout(Duration::from_secs(args.connect_timeout))
            .with_headers(utils::parse_headers(&args.headers));

        if let Some(referer) = &args.referer {
            builder = builder.with_referer(referer);
        }

        if let Some(proxy) = proxy_config {
            builder = builder.with_proxy(proxy);
        } else {
            builder = builder.with_system_proxy(!args.no_proxy);
        }
        builder.build()
    };

    let session = SessionCredential::new(&args.cookie_name, &args.session);
    let auth = AuthContext::default()
        .with_session(session)
        .map_err(|e| AppError::InvalidInput(format!("Invalid session id: {e}")))?;

    let mut transcoder = FfmpegTranscoder::discover(args.ffmpeg.as_deref())?;
    if args.ffmpeg_timeout > 0 {
        transcoder = transcoder.with_timeout(Duration::from_secs(args.ffmpeg_timeout));
    }
    info!(ffmpeg = %transcoder.program().display(), "Using transcoder");

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let mut pipeline_config = PipelineConfig::new(output_dir)
        .with_download_concurrency(args.concurrency)
        .with_output_format(args.format)
        .with_retention(args.retention);
    if let Some(work_dir) = args.work_dir {
        pipeline_config = pipeline_config.with_work_dir(work_dir);
    }
    if let Some(base_name) = args.base_name {
        pipeline_config = pipeline_config.with_base_name(base_name);
    }

    // Create a progress manager based on show_progress flag
    let multi = MultiProgress::new();
    let progress_manager = if args.show_progress {
        ProgressManager::new(multi.clone())
    } else {
        ProgressManager::new_disabled(multi.clone())
    };

    let mut pipeline = Pipeline::with_http(
        pipeline_config,
        &download_config,
        auth,
        Arc::new(transcoder),
    )?
    .with_observer(Arc::new(move |event| {
        progress_manager.handle_event(event);
    }));

    info!(
        output_dir = %pipeline.config().output_dir.display(),
        work_dir = %pipeline.config().work_dir().display(),
        concurrency = pipeline.config().download_concurrency,
        format = %pipeline.config().output_format,
        "Pipeline configured"
    );

    // Stop cleanly on Ctrl+C so intermediates are settled
    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    let output = pipeline.run(&args.url).await?;

    if args.json {
        let summary = serde_json::to_string_pretty(&output)?;
        println!("{summary}");
    } else {
        println!("{}", output.artifact.display());
        println!("Content-Type: {}", output.mime_type);
        for path in &output.retained {
            println!("Kept: {}", path.display());
        }
    }
    Ok(())
}

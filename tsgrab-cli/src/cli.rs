use std::path::PathBuf;

use clap::Parser;
use tsgrab_engine::{DEFAULT_SESSION_COOKIE, OutputFormat, RetentionPolicy};

/// Define CLI arguments
#[derive(Parser)]
#[command(
    author = "hua0512 <https://github.com/hua0512>",
    version,
    about = "Segmented audio stream downloader",
    long_about = "Downloads every segment listed in an HLS-style manifest, joins them into a\n\
                  single transport stream in manifest order and converts it to an audio file\n\
                  with ffmpeg. Part of the rust-srec project: https://github.com/hua0512/rust-srec"
)]
pub struct CliArgs {
    /// Manifest URL
    #[arg(required = true, help = "URL of the .m3u8 manifest to download")]
    pub url: String,

    /// Session id sent as a cookie with every request
    #[arg(
        short,
        long,
        help = "Session id sent as a cookie with the manifest and segment requests"
    )]
    pub session: String,

    /// Cookie name carrying the session id
    #[arg(long, default_value = DEFAULT_SESSION_COOKIE, help = "Cookie name for the session id")]
    pub cookie_name: String,

    /// Output directory for the final audio file
    #[arg(
        short,
        long,
        help = "Directory where the audio file will be saved (default: ./downloaded_audio)"
    )]
    pub output_dir: Option<PathBuf>,

    /// Directory for segments and the assembled container
    #[arg(long, help = "Directory for intermediate files (default: the output directory)")]
    pub work_dir: Option<PathBuf>,

    /// Override the output base name
    #[arg(
        short = 'n',
        long = "name",
        help = "Base name of the output file (default: derived from the manifest URL)"
    )]
    pub base_name: Option<String>,

    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Mp3,
        help = "Audio format of the output file"
    )]
    pub format: OutputFormat,

    #[arg(
        long = "keep-intermediates",
        value_enum,
        default_value_t = RetentionPolicy::Never,
        help = "When to keep downloaded segments and the assembled container"
    )]
    pub retention: RetentionPolicy,

    /// Path to the ffmpeg executable
    #[arg(long, help = "Path to ffmpeg (default: looked up on PATH)")]
    pub ffmpeg: Option<PathBuf>,

    /// Kill ffmpeg after this many seconds
    #[arg(long, default_value = "0", help = "Transcode timeout in seconds. Use 0 for unlimited.")]
    pub ffmpeg_timeout: u64,

    /// Number of concurrent segment downloads
    #[arg(
        short = 'c',
        long,
        default_value = "4",
        help = "Maximum number of concurrent segment downloads"
    )]
    pub concurrency: usize,

    /// Referer sent with every request
    #[arg(long, help = "Referer header some hosts require before serving segments")]
    pub referer: Option<String>,

    /// Custom HTTP headers for download requests
    #[arg(
        long = "header",
        short = 'H',
        help = "Add custom HTTP header to requests (can be used multiple times). Format: 'Name: Value'",
        value_name = "HEADER"
    )]
    pub headers: Vec<String>,

    /// Overall timeout in seconds
    #[arg(
        long,
        default_value = "0",
        help = "Overall timeout in seconds for HTTP requests. Use 0 for unlimited."
    )]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value = "30",
        help = "Connection timeout in seconds (time to establish initial connection)"
    )]
    pub connect_timeout: u64,

    /// Proxy URL (e.g., "http://proxy.example.com:8080")
    #[arg(
        long,
        help = "Proxy server URL for downloads (e.g., \"http://proxy.example.com:8080\")"
    )]
    pub proxy: Option<String>,

    /// Proxy type (http, https, socks5, all)
    #[arg(
        long,
        default_value = "all",
        help = "Proxy type (http, https, socks5, all)",
        value_parser = ["http", "https", "socks5", "all"]
    )]
    pub proxy_type: String,

    /// Proxy username
    #[arg(long, help = "Username for proxy authentication")]
    pub proxy_user: Option<String>,

    /// Proxy password
    #[arg(long, help = "Password for proxy authentication")]
    pub proxy_pass: Option<String>,

    /// Disable all proxy settings for downloads
    #[arg(
        long,
        help = "Disable all proxy settings (including system proxy) for downloads"
    )]
    pub no_proxy: bool,

    /// Show progress bars
    #[arg(
        short = 'P',
        long = "progress",
        default_value = "false",
        help = "Show a progress bar for segment downloads"
    )]
    pub show_progress: bool,

    /// Print the run summary as JSON
    #[arg(long, help = "Print the result as JSON instead of plain text")]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::parse_from(["tsgrab", "https://host/a/index.m3u8", "--session", "abc"]);
        assert_eq!(args.cookie_name, "JSESSIONID");
        assert_eq!(args.format, OutputFormat::Mp3);
        assert_eq!(args.retention, RetentionPolicy::Never);
        assert_eq!(args.concurrency, 4);
        assert!(args.output_dir.is_none());
        assert!(!args.json);
    }

    #[test]
    fn session_is_required() {
        assert!(CliArgs::try_parse_from(["tsgrab", "https://host/a/index.m3u8"]).is_err());
    }

    #[test]
    fn value_enums() {
        let args = CliArgs::parse_from([
            "tsgrab",
            "https://host/a/index.m3u8",
            "-s",
            "abc",
            "--format",
            "opus",
            "--keep-intermediates",
            "on-failure",
            "-H",
            "Origin: https://host",
        ]);
        assert_eq!(args.format, OutputFormat::Opus);
        assert_eq!(args.retention, RetentionPolicy::OnFailure);
        assert_eq!(args.headers, vec!["Origin: https://host".to_string()]);
    }
}

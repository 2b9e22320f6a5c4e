use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::proxy::ProxyConfig;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

/// Browser-like request headers sent with every manifest and segment request.
const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("accept", "*/*"),
    ("accept-language", "en-US,en;q=0.9"),
    ("priority", "u=1, i"),
    (
        "sec-ch-ua",
        "\"Not(A:Brand\";v=\"99\", \"Google Chrome\";v=\"133\", \"Chromium\";v=\"133\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-origin"),
];

/// HTTP options shared by every request of a pipeline run
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Overall timeout for a single request, zero disables it
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection), zero disables it
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Default HTTP headers for requests
    pub headers: HeaderMap,

    /// Proxy configuration (optional)
    pub proxy: Option<ProxyConfig>,

    /// Whether to use system proxy settings if available
    pub use_system_proxy: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            connect_timeout: Duration::from_secs(30),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: DownloaderConfig::get_default_headers(),
            proxy: None,
            use_system_proxy: true,
        }
    }
}

impl DownloaderConfig {
    pub fn builder() -> crate::builder::DownloaderConfigBuilder {
        crate::builder::DownloaderConfigBuilder::new()
    }

    /// Merge `extra` over the default header set. Entries in `extra` win.
    pub fn merge_headers(extra: &HeaderMap) -> HeaderMap {
        let mut headers = DownloaderConfig::get_default_headers();
        for (name, value) in extra.iter() {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::with_capacity(DEFAULT_HEADERS.len());
        for (name, value) in DEFAULT_HEADERS {
            default_headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        default_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_headers_look_like_a_browser() {
        let headers = DownloaderConfig::get_default_headers();
        assert_eq!(headers.get("accept").unwrap(), "*/*");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "cors");
        assert!(headers.get("referer").is_none());
    }

    #[test]
    fn merge_headers_overrides_defaults() {
        let mut extra = HeaderMap::new();
        extra.insert("accept", HeaderValue::from_static("audio/*"));
        extra.insert("referer", HeaderValue::from_static("https://example.com/"));

        let merged = DownloaderConfig::merge_headers(&extra);
        assert_eq!(merged.get("accept").unwrap(), "audio/*");
        assert_eq!(merged.get("referer").unwrap(), "https://example.com/");
        assert_eq!(merged.get("sec-ch-ua-mobile").unwrap(), "?0");
    }
}

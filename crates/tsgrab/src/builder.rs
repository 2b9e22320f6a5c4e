//! # Builder for DownloaderConfig
//!
//! Fluent construction of the HTTP options used by a pipeline run.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tsgrab_engine::DownloaderConfig;
//! use tsgrab_engine::proxy::{ProxyConfig, ProxyType};
//!
//! let config = DownloaderConfig::builder()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_connect_timeout(Duration::from_secs(15))
//!     .with_referer("https://example.com/audios")
//!     .with_header("X-Api-Key", "my-secret-key")
//!     .build();
//!
//! let proxied = DownloaderConfig::builder()
//!     .with_proxy(ProxyConfig {
//!         url: "socks5://127.0.0.1:1080".to_string(),
//!         proxy_type: ProxyType::Socks5,
//!         auth: None,
//!     })
//!     .build();
//! # let _ = (config, proxied);
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER};
use tracing::warn;

use crate::{DownloaderConfig, proxy::ProxyConfig};

/// Builder for creating DownloaderConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct DownloaderConfigBuilder {
    config: DownloaderConfig,
}

impl DownloaderConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DownloaderConfig::default(),
        }
    }

    /// Set the overall timeout for a single HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header. Invalid names or values are ignored with a warning.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match (
            name.as_ref().parse::<HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.config.headers.insert(name, value);
            }
            _ => warn!(name = name.as_ref(), "Ignoring invalid header"),
        }
        self
    }

    /// Merge headers over the current set, replacing entries with the same name
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.config.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Set the `Referer` header some hosts require before serving segments
    pub fn with_referer(self, referer: impl AsRef<str>) -> Self {
        self.with_header(REFERER.as_str(), referer)
    }

    /// Set the proxy configuration
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = Some(proxy);
        self.config.use_system_proxy = false; // Explicit proxy overrides system proxy
        self
    }

    /// Set whether to use system proxy settings if available
    pub fn with_system_proxy(mut self, use_system_proxy: bool) -> Self {
        if self.config.proxy.is_none() {
            self.config.use_system_proxy = use_system_proxy;
        }
        self
    }

    pub fn build(self) -> DownloaderConfig {
        self.config
    }
}

impl Default for DownloaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::proxy::{ProxyAuth, ProxyType};

    use super::*;
    use std::time::Duration;

    #[test]
    fn test_builder_defaults() {
        let config = DownloaderConfigBuilder::new().build();
        assert_eq!(config.timeout, Duration::ZERO);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert!(config.follow_redirects);
        assert!(config.use_system_proxy);
        assert!(config.proxy.is_none());
        assert!(config.user_agent.contains("Chrome/133"));
    }

    #[test]
    fn test_builder_customization() {
        let config = DownloaderConfigBuilder::new()
            .with_timeout(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(20))
            .with_follow_redirects(false)
            .with_user_agent("CustomUserAgent/1.0")
            .with_header("X-Custom-Header", "CustomValue")
            .with_referer("https://example.com/audios?type=messages")
            .with_system_proxy(false)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(20));
        assert!(!config.follow_redirects);
        assert_eq!(config.user_agent, "CustomUserAgent/1.0");
        assert!(!config.use_system_proxy);

        let header_value = config.headers.get("X-Custom-Header").unwrap();
        assert_eq!(header_value.to_str().unwrap(), "CustomValue");
        assert_eq!(
            config.headers.get(REFERER).unwrap(),
            "https://example.com/audios?type=messages"
        );
        // defaults survive
        assert_eq!(config.headers.get("accept").unwrap(), "*/*");
    }

    #[test]
    fn test_invalid_header_is_ignored() {
        let config = DownloaderConfigBuilder::new()
            .with_header("bad header", "value")
            .build();
        assert!(config.headers.get("bad header").is_none());
    }

    #[test]
    fn test_proxy_configuration() {
        let proxy_config = ProxyConfig {
            url: "http://proxy.example.com:8080".to_string(),
            proxy_type: ProxyType::Http,
            auth: Some(ProxyAuth {
                username: "user".to_string(),
                password: "pass".to_string(),
            }),
        };

        let config_with_proxy = DownloaderConfigBuilder::new()
            .with_proxy(proxy_config.clone())
            .with_system_proxy(true)
            .build();

        assert!(!config_with_proxy.use_system_proxy);
        let stored_proxy = config_with_proxy.proxy.unwrap();
        assert_eq!(stored_proxy.url, proxy_config.url);
        assert_eq!(stored_proxy.auth.as_ref().unwrap().username, "user");
        assert_eq!(stored_proxy.proxy_type, ProxyType::Http);
    }
}

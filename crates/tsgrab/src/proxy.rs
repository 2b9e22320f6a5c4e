use std::str::FromStr;

use reqwest::Proxy;

/// Which requests a proxy applies to
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum ProxyType {
    Http,
    Https,
    Socks5,
    /// Route every request through the proxy
    All,
}

impl FromStr for ProxyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(ProxyType::Http),
            "https" => Ok(ProxyType::Https),
            "socks5" => Ok(ProxyType::Socks5),
            "all" => Ok(ProxyType::All),
            other => Err(format!("unknown proxy type '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// Proxy configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Proxy server URL (e.g., "http://proxy.example.com:8080")
    pub url: String,
    pub proxy_type: ProxyType,
    pub auth: Option<ProxyAuth>,
}

impl ProxyConfig {
    /// Build the reqwest proxy for this configuration
    pub fn build(&self) -> Result<Proxy, String> {
        let mut proxy = match self.proxy_type {
            ProxyType::Http => Proxy::http(&self.url),
            ProxyType::Https => Proxy::https(&self.url),
            ProxyType::Socks5 => {
                let url = if self.url.starts_with("socks5://") || self.url.starts_with("socks5h://")
                {
                    self.url.clone()
                } else {
                    format!("socks5://{}", self.url)
                };
                Proxy::all(url)
            }
            ProxyType::All => Proxy::all(&self.url),
        }
        .map_err(|e| format!("invalid {:?} proxy URL '{}': {e}", self.proxy_type, self.url))?;

        if let Some(auth) = &self.auth {
            proxy = proxy.basic_auth(&auth.username, &auth.password);
        }

        Ok(proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_proxy_type() {
        assert_eq!("SOCKS5".parse::<ProxyType>().unwrap(), ProxyType::Socks5);
        assert_eq!("all".parse::<ProxyType>().unwrap(), ProxyType::All);
        assert!("ftp".parse::<ProxyType>().is_err());
    }

    #[test]
    fn socks5_scheme_is_added() {
        let config = ProxyConfig {
            url: "127.0.0.1:1080".to_string(),
            proxy_type: ProxyType::Socks5,
            auth: None,
        };
        assert!(config.build().is_ok());
    }
}

//! Request context shared by every fetch of a pipeline run.
//!
//! An [`AuthContext`] is built once and then only read. Fetch workers hold it
//! behind an `Arc`.

use std::fmt;

use reqwest::RequestBuilder;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, InvalidHeaderValue};

/// Cookie name used when the caller supplies a bare session id.
pub const DEFAULT_SESSION_COOKIE: &str = "JSESSIONID";

/// An opaque session credential sent as a cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    name: String,
    value: String,
}

impl SessionCredential {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// A `JSESSIONID` credential
    pub fn session_id(value: impl Into<String>) -> Self {
        Self::new(DEFAULT_SESSION_COOKIE, value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn cookie_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

// Keep session ids out of logs.
impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Per-request headers plus the session credential.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    headers: HeaderMap,
    cookie: Option<HeaderValue>,
    session: Option<SessionCredential>,
}

impl AuthContext {
    pub fn new(headers: HeaderMap) -> Self {
        Self {
            headers,
            cookie: None,
            session: None,
        }
    }

    /// Attach a session credential. Fails if it cannot be expressed as a header value.
    pub fn with_session(
        mut self,
        session: SessionCredential,
    ) -> Result<Self, InvalidHeaderValue> {
        let mut cookie = HeaderValue::from_str(&session.cookie_pair())?;
        cookie.set_sensitive(true);
        self.cookie = Some(cookie);
        self.session = Some(session);
        Ok(self)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn session(&self) -> Option<&SessionCredential> {
        self.session.as_ref()
    }

    /// The `Cookie` header value sent with each request, if a session is set
    pub fn cookie_header(&self) -> Option<&HeaderValue> {
        self.cookie.as_ref()
    }

    /// Decorate a request with the context headers and session cookie
    pub fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        if !self.headers.is_empty() {
            request = request.headers(self.headers.clone());
        }
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie.clone());
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_becomes_cookie_header() {
        let ctx = AuthContext::default()
            .with_session(SessionCredential::session_id("87455767E32B4B31"))
            .unwrap();
        assert_eq!(
            ctx.cookie_header().unwrap().to_str().unwrap(),
            "JSESSIONID=87455767E32B4B31"
        );
        assert_eq!(ctx.session().unwrap().name(), "JSESSIONID");
    }

    #[test]
    fn rejects_session_with_control_characters() {
        let result = AuthContext::default().with_session(SessionCredential::new("sid", "a\nb"));
        assert!(result.is_err());
    }

    #[test]
    fn debug_output_hides_session_value() {
        let credential = SessionCredential::new("sid", "secret-token");
        let printed = format!("{credential:?}");
        assert!(!printed.contains("secret-token"));
    }
}

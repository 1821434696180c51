//! Transport trait and implementations.
//!
//! A [`Transport`] performs exactly one HTTP exchange. It reports
//! transport-level failures as [`Network`](crate::error::ErrorKind::Network)
//! errors but does **not** interpret status codes: a 500 is a perfectly
//! valid [`Response`]. Status handling and retries are layered on top by
//! [`fetch_with_retry`](crate::fetch_with_retry).

mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::http::HttpTransport;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockReply, MockTransport, RecordedRequest};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use serde::de::DeserializeOwned;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// HTTP methods the asset layer ever needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    /// Existence probes and connection warming.
    Head,
}
impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Head => write!(f, "HEAD"),
        }
    }
}

/// A single outbound request against a fully-qualified URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
}
impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self {
            method: Method::Head,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A fully-buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL (after redirects, for real transports).
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Empty for `HEAD` requests.
    pub body: Vec<u8>,
}
impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into the matching tagged error.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        exn::bail!(ErrorKind::from_status(self.status, self.url))
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).or_raise(|| ErrorKind::InvalidBody(self.url.clone()))
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Unified interface for HTTP transports.
///
/// # Examples
///
/// ```
/// use vela_storage::{Request, Transport, error::Result};
///
/// async fn content_length(transport: &dyn Transport, url: &str) -> Result<usize> {
///     let response = transport.send(&Request::get(url)).await?.error_for_status()?;
///     Ok(response.body.len())
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request. Must not retry internally.
    async fn send(&self, request: &Request) -> Result<Response>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn response(status: u16, body: &[u8]) -> Response {
        Response {
            url: "https://bucket.example/a.json".to_string(),
            status,
            content_type: Some("application/json".to_string()),
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_error_for_status() {
        assert!(response(204, b"").error_for_status().is_ok());
        let err = response(404, b"").error_for_status().unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(url) if url.ends_with("a.json")));
        let err = response(500, b"").error_for_status().unwrap_err();
        assert!(matches!(&*err, ErrorKind::HttpStatus { status: 500, .. }));
    }

    #[test]
    fn test_json_body() {
        #[derive(Debug, Deserialize)]
        struct Payload {
            name: String,
        }
        let payload: Payload = response(200, br#"{"name":"unit"}"#).json().unwrap();
        assert_eq!(payload.name, "unit");
        let err = response(200, b"not json").json::<Payload>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidBody(_)));
    }

    #[test]
    fn test_request_builders() {
        let request = Request::head("https://bucket.example/x").with_header("accept", "*/*");
        assert_eq!(request.method, Method::Head);
        assert_eq!(request.headers, vec![("accept".to_string(), "*/*".to_string())]);
        assert_eq!(Method::Get.to_string(), "GET");
    }
}

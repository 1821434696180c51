//! HTTP transport backed by [`reqwest`].

use super::{Method, Request, Response, Transport};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::instrument;

const USER_AGENT: &str = concat!("vela/", env!("CARGO_PKG_VERSION"));

/// [`Transport`] over a pooled [`reqwest::Client`].
///
/// No per-request timeout is configured: an attempt runs until the server
/// answers or the connection fails.
///
/// # Examples
///
/// ```no_run
/// use vela_storage::{Request, Transport, transport::HttpTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new()?;
/// let response = transport.send(&Request::head("https://example.com/cover.png")).await?;
/// println!("{}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}
impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .or_raise(|| ErrorKind::Network("failed to build HTTP client".to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shared connection pool, custom TLS, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(level = "debug", skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &Request) -> Result<Response> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
        };
        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder.send().await.or_raise(|| ErrorKind::Network(request.url.clone()))?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = match request.method {
            Method::Head => Vec::new(),
            Method::Get => response.bytes().await.or_raise(|| ErrorKind::Network(url.clone()))?.to_vec(),
        };
        tracing::debug!(status, bytes = body.len(), "response received");
        Ok(Response {
            url,
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let transport = HttpTransport::new().unwrap();
        // Guaranteed-closed port -> connection refused.
        let err = transport.send(&Request::get("http://127.0.0.1:1/")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Network(url) if url == "http://127.0.0.1:1/"));
        assert!(err.is_retryable());
    }
}

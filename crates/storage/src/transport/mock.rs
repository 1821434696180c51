//! Scripted in-memory transport for testing.

use super::{Method, Request, Response, Transport};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// One scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Answer with this status and body.
    Status(u16, Vec<u8>),
    /// Fail at the transport level (connection reset).
    NetworkError,
}
impl MockReply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::Status(200, body.into())
    }

    pub fn status(status: u16) -> Self {
        Self::Status(status, Vec::new())
    }
}

/// A request as observed by [`MockTransport`], stamped with the (possibly
/// paused) Tokio clock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub at: Instant,
}

/// In-memory transport for testing.
///
/// Each URL owns a queue of [`MockReply`]s. Replies are consumed in order
/// and the last one repeats forever. Unknown URLs answer `404`. Every
/// request is recorded so tests can assert on call counts and timing.
///
/// # Examples
///
/// ```ignore
/// use vela_storage::transport::{MockReply, MockTransport};
/// use vela_storage::{Request, Transport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = MockTransport::default()
///     .with_replies("https://bucket/a.png", [MockReply::NetworkError, MockReply::ok(*b"png")]);
/// assert!(transport.send(&Request::get("https://bucket/a.png")).await.is_err());
/// assert_eq!(transport.send(&Request::get("https://bucket/a.png")).await?.body, b"png");
/// assert_eq!(transport.attempts("https://bucket/a.png").await, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<MockReply>>>,
    log: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Script the replies for a URL, replacing any previous script.
    ///
    /// Panics if `replies` is empty. If test setup is wrong, then test
    /// should not pass.
    pub fn with_replies(mut self, url: impl Into<String>, replies: impl IntoIterator<Item = MockReply>) -> Self {
        let url = url.into();
        let replies: VecDeque<MockReply> = replies.into_iter().collect();
        if replies.is_empty() {
            panic!("MockTransport::with_replies: no replies scripted for {url}");
        }
        self.routes.get_mut().insert(url, replies);
        self
    }

    /// Shorthand for a URL that always answers `200` with `body`.
    pub fn with_body(self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.with_replies(url, [MockReply::ok(body)])
    }

    /// All requests seen so far, in arrival order.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().await.clone()
    }

    /// Number of requests seen for a URL.
    pub async fn attempts(&self, url: &str) -> usize {
        self.log.lock().await.iter().filter(|r| r.url == url).count()
    }

    async fn next_reply(&self, url: &str) -> MockReply {
        let mut routes = self.routes.lock().await;
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(MockReply::status(404)),
            Some(queue) => queue.front().cloned().unwrap_or(MockReply::status(404)),
            None => MockReply::status(404),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &Request) -> Result<Response> {
        self.log.lock().await.push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            at: Instant::now(),
        });
        match self.next_reply(&request.url).await {
            MockReply::NetworkError => exn::bail!(ErrorKind::Network(request.url.clone())),
            MockReply::Status(status, body) => Ok(Response {
                url: request.url.clone(),
                status,
                content_type: None,
                body: match request.method {
                    Method::Head => Vec::new(),
                    Method::Get => body,
                },
            }),
        }
    }
}

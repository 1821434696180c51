use crate::error::{ErrorKind, Result};
use crate::location::S3Location;
use crate::retry::{RetryPolicy, fetch_with_retry};
use crate::transport::{Request, Response};
use crate::TransportHandle;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::instrument;

/// Bucket-aware asset client: a [`Transport`](crate::Transport), an
/// [`S3Location`] and a [`RetryPolicy`].
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct AssetClient {
    transport: TransportHandle,
    location: S3Location,
    policy: RetryPolicy,
}

impl AssetClient {
    pub fn new(transport: TransportHandle, location: S3Location, policy: RetryPolicy) -> Self {
        Self {
            transport,
            location,
            policy,
        }
    }

    pub fn location(&self) -> &S3Location {
        &self.location
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch a bucket key with retries. Failures are returned to the caller.
    pub async fn fetch(&self, key: &str) -> Result<Response> {
        let url = self.location.url_for(key)?;
        fetch_with_retry(self.transport.as_ref(), &Request::get(url), &self.policy).await
    }

    /// Fetch a bucket key and decode it as JSON.
    pub async fn fetch_json<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.fetch(key).await?.json()
    }

    /// Single `HEAD` request, no retries. `Ok(false)` only for 404/410;
    /// every other failure is returned.
    pub async fn probe(&self, key: &str) -> Result<bool> {
        match self.head(key).await?.error_for_status() {
            Ok(_) => Ok(true),
            Err(error) if matches!(&*error, ErrorKind::NotFound(_)) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// [`probe`](Self::probe) with any failure (invalid key, network,
    /// non-2xx) logged and reported as `false`.
    #[instrument(skip(self))]
    pub async fn exists(&self, key: &str) -> bool {
        match self.probe(key).await {
            Ok(found) => found,
            Err(error) => {
                tracing::warn!(error = %*error, "Error checking resource existence");
                false
            },
        }
    }

    async fn head(&self, key: &str) -> Result<Response> {
        let url = self.location.url_for(key)?;
        self.transport.send(&Request::head(url)).await
    }

    /// Warm the connection for a key in the background. The caller does not
    /// need to await the returned handle; failures are only logged.
    pub fn preload(&self, key: impl Into<String>) -> JoinHandle<()> {
        let client = self.clone();
        let key = key.into();
        tokio::spawn(async move {
            match client.head(&key).await.and_then(Response::error_for_status) {
                Ok(_) => tracing::debug!(key = %key, "Preloaded asset"),
                Err(error) => tracing::warn!(key = %key, error = %*error, "Preload failed"),
            }
        })
    }

    /// [`preload`](Self::preload) every key.
    pub fn preload_many<I>(&self, keys: I) -> Vec<JoinHandle<()>>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        keys.into_iter().map(|key| self.preload(key)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, MockReply, MockTransport};
    use serde::Deserialize;
    use std::sync::Arc;
    use std::time::Duration;

    const BASE: &str = "https://bucket.example";

    fn client(transport: Arc<MockTransport>) -> AssetClient {
        let location = S3Location::new(BASE, None).unwrap();
        AssetClient::new(transport, location, RetryPolicy::new(1, Duration::from_millis(10)))
    }

    #[tokio::test]
    async fn test_fetch_json() {
        #[derive(Deserialize)]
        struct Bank {
            questions: Vec<String>,
        }
        let transport = Arc::new(
            MockTransport::default().with_body(format!("{BASE}/qa/book1.json"), br#"{"questions":["What is it?"]}"#),
        );
        let bank: Bank = client(transport).fetch_json("/qa/book1.json").await.unwrap();
        assert_eq!(bank.questions, vec!["What is it?".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_with_policy() {
        let url = format!("{BASE}/a.png");
        let transport = Arc::new(MockTransport::default().with_replies(&url, [MockReply::NetworkError, MockReply::ok(*b"png")]));
        let response = client(transport.clone()).fetch("a.png").await.unwrap();
        assert_eq!(response.body, b"png");
        assert_eq!(transport.attempts(&url).await, 2);
    }

    #[tokio::test]
    async fn test_fetch_invalid_key_sends_nothing() {
        let transport = Arc::new(MockTransport::default());
        let err = client(transport.clone()).fetch("../escape").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(_)));
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_exists() {
        let transport = Arc::new(
            MockTransport::default()
                .with_body(format!("{BASE}/present.pdf"), *b"%PDF")
                .with_replies(format!("{BASE}/flaky.pdf"), [MockReply::NetworkError]),
        );
        let client = client(transport.clone());
        assert!(client.exists("present.pdf").await);
        assert!(!client.exists("absent.pdf").await);
        assert!(!client.exists("flaky.pdf").await);
        // Existence checks never retry.
        assert_eq!(transport.attempts(&format!("{BASE}/flaky.pdf")).await, 1);
        assert!(transport.requests().await.iter().all(|r| r.method == Method::Head));
    }

    #[tokio::test]
    async fn test_probe_separates_missing_from_failing() {
        let transport = Arc::new(
            MockTransport::default()
                .with_body(format!("{BASE}/present.pdf"), *b"%PDF")
                .with_replies(format!("{BASE}/down.pdf"), [MockReply::status(503)]),
        );
        let client = client(transport.clone());
        assert!(client.probe("present.pdf").await.unwrap());
        assert!(!client.probe("absent.pdf").await.unwrap());
        let err = client.probe("down.pdf").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::HttpStatus { status: 503, .. }));
        assert_eq!(transport.attempts(&format!("{BASE}/down.pdf")).await, 1);
    }

    #[tokio::test]
    async fn test_preload_many_swallows_failures() {
        let transport = Arc::new(MockTransport::default().with_body(format!("{BASE}/a.png"), *b"a"));
        let handles = client(transport.clone()).preload_many(["a.png", "missing.png", "../bad"]);
        for handle in handles {
            handle.await.unwrap();
        }
        // The invalid key never reaches the transport.
        assert_eq!(transport.requests().await.len(), 2);
    }
}

//! Retry logic with exponential backoff for asset requests.
//!
//! Every failed attempt is retried until the budget is spent: transport
//! errors and any non-2xx status alike. The delay doubles after each retry
//! with no jitter and no ceiling (1s, 2s, 4s, ... with the defaults). There
//! is no cancellation and no overall timeout: once started, a sequence runs
//! to success or exhaustion.

use crate::error::{ErrorKind, Result};
use crate::transport::{Request, Response, Transport};
use std::time::Duration;
use tokio::time::sleep;
use tracing::instrument;

/// Maximum number of retries after the initial request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Bounds for [`fetch_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; total attempts is `max_retries + 1`.
    pub max_retries: u32,
    /// Wait before the first retry, doubled before each subsequent one.
    pub initial_delay: Duration,
}
impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}
impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self { max_retries, initial_delay }
    }

    /// A policy that performs exactly one attempt.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay slept before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }
}

/// Send `request`, retrying transport failures and non-2xx responses with
/// exponential backoff.
///
/// On success the response is returned unmodified. Once `max_retries`
/// retries have failed, the error from the final attempt is returned to the
/// caller, who decides how to present the failure (placeholder image, error
/// banner). Errors that happen before anything is sent are never retried.
///
/// # Examples
///
/// ```no_run
/// use vela_storage::{Request, RetryPolicy, fetch_with_retry, transport::HttpTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new()?;
/// let request = Request::get("https://example.com/book1/cover.png");
/// let response = fetch_with_retry(&transport, &request, &RetryPolicy::default()).await?;
/// println!("{} bytes", response.body.len());
/// # Ok(())
/// # }
/// ```
#[instrument(skip(transport, request), fields(method = %request.method, url = %request.url))]
pub async fn fetch_with_retry(transport: &dyn Transport, request: &Request, policy: &RetryPolicy) -> Result<Response> {
    let mut retry_count = 0;
    loop {
        let error = match attempt(transport, request).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };
        let kind: &ErrorKind = &error;
        if retry_count >= policy.max_retries || !kind.is_request_failure() {
            if retry_count > 0 {
                tracing::warn!(attempts = retry_count + 1, error = %kind, "Resource load failed, giving up");
            }
            return Err(error);
        }
        let delay = policy.delay_for(retry_count);
        tracing::warn!(
            attempt = retry_count + 1,
            max_retries = policy.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %kind,
            "Resource load failed, retrying"
        );
        sleep(delay).await;
        retry_count += 1;
    }
}

async fn attempt(transport: &dyn Transport, request: &Request) -> Result<Response> {
    transport.send(request).await?.error_for_status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockReply, MockTransport};
    use rstest::rstest;
    use tokio::time::Instant;

    const URL: &str = "https://bucket.example/book1/unit1/01 A.jpg";

    fn gaps(instants: &[Instant]) -> Vec<Duration> {
        instants.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }

    fn assert_close(actual: Duration, expected_ms: u64) {
        let expected = Duration::from_millis(expected_ms);
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected ~{expected:?}, waited {actual:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_fourth_attempt_with_doubling_delays() {
        let transport = MockTransport::default().with_replies(
            URL,
            [
                MockReply::NetworkError,
                MockReply::status(503),
                MockReply::NetworkError,
                MockReply::ok(*b"jpeg"),
            ],
        );
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        let response = fetch_with_retry(&transport, &Request::get(URL), &policy).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"jpeg");

        let instants: Vec<Instant> = transport.requests().await.iter().map(|r| r.at).collect();
        assert_eq!(instants.len(), 4);
        let waited = gaps(&instants);
        assert_close(waited[0], 1000);
        assert_close(waited[1], 2000);
        assert_close(waited[2], 4000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let transport = MockTransport::default().with_replies(URL, [MockReply::NetworkError, MockReply::status(500)]);
        let policy = RetryPolicy::new(2, Duration::from_millis(1000));
        let err = fetch_with_retry(&transport, &Request::get(URL), &policy).await.unwrap_err();
        // Initial attempt + 2 retries.
        assert_eq!(transport.attempts(URL).await, 3);
        assert!(matches!(&*err, ErrorKind::HttpStatus { status: 500, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_retried_then_tagged() {
        // Unknown URLs answer 404 on the mock.
        let transport = MockTransport::default();
        let err = fetch_with_retry(&transport, &Request::get(URL), &RetryPolicy::default()).await.unwrap_err();
        assert_eq!(transport.attempts(URL).await, 4);
        assert!(matches!(&*err, ErrorKind::NotFound(url) if url == URL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_wait() {
        let transport = MockTransport::default().with_body(URL, *b"ok");
        let started = Instant::now();
        fetch_with_retry(&transport, &Request::get(URL), &RetryPolicy::default()).await.unwrap();
        assert_eq!(Instant::now() - started, Duration::ZERO);
        assert_eq!(transport.attempts(URL).await, 1);
    }

    #[tokio::test]
    async fn test_no_retries_policy() {
        let transport = MockTransport::default().with_replies(URL, [MockReply::NetworkError]);
        let err = fetch_with_retry(&transport, &Request::get(URL), &RetryPolicy::none()).await.unwrap_err();
        assert_eq!(transport.attempts(URL).await, 1);
        assert!(matches!(&*err, ErrorKind::Network(_)));
    }

    #[rstest]
    #[case(0, 1000)]
    #[case(1, 2000)]
    #[case(2, 4000)]
    #[case(5, 32000)]
    fn test_delay_for(#[case] retry: u32, #[case] expected_ms: u64) {
        assert_eq!(RetryPolicy::default().delay_for(retry), Duration::from_millis(expected_ms));
    }

    #[test]
    fn test_delay_for_saturates() {
        assert_eq!(RetryPolicy::default().delay_for(200), Duration::from_millis(1000).saturating_mul(u32::MAX));
    }
}

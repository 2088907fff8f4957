//! Network retrieval with exponential backoff retry logic.
//!
//! This module provides the rate-limited fetcher used for every outbound
//! HTTP call: article pages, search feeds, and enrichment APIs. It includes
//! automatic retry logic with exponential backoff and jitter to handle
//! transient failures gracefully.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`FetchAsync`]: Core trait defining an async retrieval
//! - [`PageFetcher`]: Performs a single HTTP GET with a hard timeout
//! - [`RetryFetch`]: Decorator that adds retry logic to any [`FetchAsync`]
//!   implementation
//!
//! # Retry Strategy
//!
//! - Fixed attempt budget (3 attempts total for page fetches)
//! - Exponential backoff starting at 2 seconds
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//! - Only transient failures retry: connection errors, timeouts, and 5xx
//!   responses. Client errors and malformed URLs fail immediately.
//!
//! No concurrency cap lives here; the orchestrator bounds its own fan-out.

use rand::{rng, Rng};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::Client;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::errors::{FetchError, FetchReason};

/// Total attempt budget per fetch, including the first try.
pub const FETCH_ATTEMPTS: usize = 3;
/// Initial backoff delay; doubles each attempt.
pub const FETCH_BASE_DELAY: StdDuration = StdDuration::from_secs(2);
/// Hard per-call deadline for page retrievals.
pub const FETCH_TIMEOUT: StdDuration = StdDuration::from_secs(15);

/// Trait for async network retrieval.
///
/// Implementors of this trait retrieve something from the network given a
/// target (usually a URL). The abstraction exists so decorators like
/// [`RetryFetch`] can wrap any retrieval, including the enrichment API
/// clients.
pub trait FetchAsync {
    /// The type of payload returned on success.
    type Response;

    /// Perform one retrieval attempt.
    async fn fetch(&self, target: &str) -> Result<Self::Response, FetchError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchAsync`]
/// implementation.
///
/// This decorator transparently retries transient failures with exponential
/// backoff and jitter. Permanent failures (4xx, malformed URLs, unusable
/// payloads) are returned immediately. The error that finally surfaces
/// carries the real number of attempts spent.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    /// The underlying retrieval to wrap.
    inner: T,
    /// Total attempt budget, including the first try.
    max_attempts: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    /// Create a new retry wrapper around an existing [`FetchAsync`]
    /// implementation.
    ///
    /// # Arguments
    ///
    /// * `inner` - The underlying retrieval to wrap
    /// * `max_attempts` - Total attempt budget (3 recommended)
    /// * `base_delay` - Initial delay between retries (2 seconds recommended)
    pub fn new(inner: T, max_attempts: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_attempts,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, target: &str) -> Result<Self::Response, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.fetch(target).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_transient() {
                        error!(
                            attempt,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "fetch() failed, not retryable"
                        );
                        let FetchError { reason, .. } = e;
                        return Err(FetchError { reason, attempts: attempt });
                    }

                    if attempt >= self.max_attempts {
                        error!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "fetch() exhausted attempts"
                        );
                        let FetchError { reason, .. } = e;
                        return Err(FetchError { reason, attempts: attempt });
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Perform a single HTTP GET and return the body text.
///
/// Carries browser-like headers so news sites serve the full page, and a
/// hard per-call timeout so no worker blocks indefinitely.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    timeout: StdDuration,
}

impl PageFetcher {
    /// Build a fetcher with its own HTTP client and per-call timeout.
    pub fn new(timeout: StdDuration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { client, timeout })
    }

    /// The shared HTTP client, for modules that issue their own requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl FetchAsync for PageFetcher {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, target: &str) -> Result<String, FetchError> {
        let url = Url::parse(target)
            .map_err(|e| FetchError::once(FetchReason::InvalidUrl(format!("{target}: {e}"))))?;

        let t0 = Instant::now();
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::once(classify_reqwest(&e, self.timeout)))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(FetchError::once(FetchReason::ServerStatus(status.as_u16())));
        }
        if status.is_client_error() {
            return Err(FetchError::once(FetchReason::ClientStatus(status.as_u16())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::once(classify_reqwest(&e, self.timeout)))?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u128,
            bytes = body.len(),
            "page fetched"
        );
        Ok(body)
    }
}

/// Map a `reqwest` failure onto the retry taxonomy.
pub(crate) fn classify_reqwest(e: &reqwest::Error, timeout: StdDuration) -> FetchReason {
    if e.is_timeout() {
        FetchReason::Timeout(timeout)
    } else if let Some(status) = e.status() {
        if status.is_client_error() {
            FetchReason::ClientStatus(status.as_u16())
        } else {
            FetchReason::ServerStatus(status.as_u16())
        }
    } else if e.is_builder() {
        FetchReason::InvalidUrl(e.to_string())
    } else if e.is_decode() {
        FetchReason::Malformed(e.to_string())
    } else {
        FetchReason::Connect(e.to_string())
    }
}

/// High-level page retrieval with the standard retry policy applied.
///
/// This is the primary entry point for fetching an article page. Up to
/// [`FETCH_ATTEMPTS`] attempts with exponential backoff; the returned
/// error reports how many were spent.
#[instrument(level = "info", skip_all)]
pub async fn fetch_with_backoff(fetcher: &PageFetcher, target: &str) -> Result<String, FetchError> {
    let t0 = Instant::now();
    let api = RetryFetch::new(fetcher.clone(), FETCH_ATTEMPTS, FETCH_BASE_DELAY);
    let res = api.fetch(target).await;
    let dt = t0.elapsed();

    match &res {
        Ok(body) => debug!(
            elapsed_ms_total = dt.as_millis() as u128,
            bytes = body.len(),
            "fetch_with_backoff succeeded"
        ),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u128, error = %e, "fetch_with_backoff failed")
        }
    }
    res
}

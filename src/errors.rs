//! Error taxonomy for the fetch-enrich pipeline.
//!
//! Failures are recovered as close to their origin as possible:
//! - [`FetchError`] is per network call, carrying the attempt count spent.
//! - [`ExtractionFailed`] is per article; the pipeline logs it and drops
//!   that one candidate.
//! - [`SearchError`] and [`PipelineError`] are per run (or per watch cycle).
//! - [`ConfigError`] is the only class that aborts startup.
//!
//! Enrichment stages never raise past their article: a failed stage leaves
//! its field at the "unavailable" marker and the article survives.

use std::time::Duration;
use thiserror::Error;

/// The classified cause of a failed network retrieval.
#[derive(Error, Debug)]
pub enum FetchReason {
    /// Could not establish or hold the connection.
    #[error("connection error: {0}")]
    Connect(String),
    /// The per-call deadline elapsed.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// 5xx from the remote server.
    #[error("server returned HTTP {0}")]
    ServerStatus(u16),
    /// 4xx from the remote server.
    #[error("client error HTTP {0}")]
    ClientStatus(u16),
    /// The target could not be parsed as a URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// The remote answered but the payload was not usable.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchReason {
    /// Whether a retry may plausibly succeed.
    ///
    /// Connection errors, timeouts, and 5xx responses are transient; client
    /// errors, bad URLs, and malformed payloads fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchReason::Connect(_) | FetchReason::Timeout(_) | FetchReason::ServerStatus(_)
        )
    }
}

/// A network retrieval that failed for good, after `attempts` tries.
#[derive(Error, Debug)]
#[error("{reason} after {attempts} attempt(s)")]
pub struct FetchError {
    pub reason: FetchReason,
    pub attempts: usize,
}

impl FetchError {
    /// A failure observed on a single attempt. Retry layers rewrite
    /// `attempts` with the real total before surfacing the error.
    pub fn once(reason: FetchReason) -> Self {
        FetchError { reason, attempts: 1 }
    }

    pub fn is_transient(&self) -> bool {
        self.reason.is_transient()
    }
}

/// Why one candidate was dropped during the extraction stage.
#[derive(Error, Debug)]
pub enum ExtractionFailed {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The page fetched fine but yielded no usable article text.
    #[error("page yielded no usable text")]
    EmptyBody,
}

/// The search provider could not produce a hit list.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("feed parse error: {0}")]
    Parse(String),
}

/// A whole pipeline run came up empty or could not start.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Zero articles survived dedup, extraction, and the freshness filter.
    /// Reported to the operator, exit code stays zero.
    #[error("no articles survived filtering")]
    NoResults,
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Startup misconfiguration. Fails fast before any network work, exit
/// code non-zero.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{feature} is enabled but no credential is set; provide {var} or --groq-api-key")]
    MissingCredential {
        feature: &'static str,
        var: &'static str,
    },
    #[error("a topic is required unless --url or --clear-cache is given")]
    MissingTopic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_reasons_retry() {
        assert!(FetchReason::Connect("refused".into()).is_transient());
        assert!(FetchReason::Timeout(Duration::from_secs(15)).is_transient());
        assert!(FetchReason::ServerStatus(503).is_transient());
    }

    #[test]
    fn permanent_reasons_fail_fast() {
        assert!(!FetchReason::ClientStatus(404).is_transient());
        assert!(!FetchReason::InvalidUrl("not a url".into()).is_transient());
        assert!(!FetchReason::Malformed("truncated json".into()).is_transient());
    }

    #[test]
    fn fetch_error_reports_attempts() {
        let err = FetchError {
            reason: FetchReason::ServerStatus(502),
            attempts: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("HTTP 502"), "got: {msg}");
        assert!(msg.contains("3 attempt(s)"), "got: {msg}");
    }

    #[test]
    fn once_records_a_single_attempt() {
        let err = FetchError::once(FetchReason::ClientStatus(404));
        assert_eq!(err.attempts, 1);
        assert!(!err.is_transient());
    }

    #[test]
    fn missing_credential_names_the_variable() {
        let err = ConfigError::MissingCredential {
            feature: "summarization",
            var: "GROQ_API_KEY",
        };
        let msg = err.to_string();
        assert!(msg.contains("GROQ_API_KEY"), "got: {msg}");
        assert!(msg.contains("summarization"), "got: {msg}");
    }

    #[test]
    fn no_results_is_user_facing_text() {
        let msg = PipelineError::NoResults.to_string();
        assert!(msg.contains("no articles"), "got: {msg}");
    }
}

//! Data models for search hits, articles, and report envelopes.
//!
//! This module defines the core data structures used throughout the
//! application:
//! - [`SearchHit`]: Raw result row from the search provider
//! - [`Article`]: The unit of work flowing through the pipeline
//! - [`Sentiment`] / [`SentimentLabel`]: Classification attached by the
//!   sentiment stage
//! - [`NewsReport`]: Envelope written by the JSON exporter
//!
//! An [`Article`] is created from a [`SearchHit`] once its canonical key is
//! known, mutated in place as extraction and enrichment complete, and is
//! immutable once handed to an exporter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A raw search result as returned by the search provider.
///
/// The pipeline treats the hit list as an opaque, possibly-unordered,
/// possibly-duplicated input stream; deduplication happens downstream.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Headline as the provider reported it.
    pub title: String,
    /// Link target. May still carry tracking parameters; canonicalization
    /// happens in the dedup stage.
    pub url: String,
    /// Short description from the feed, may be empty.
    pub snippet: String,
    /// Publisher name, falls back to the URL host.
    pub source: String,
    /// Publication timestamp when the feed carried a parseable one.
    pub published_at: Option<DateTime<Utc>>,
}

/// Sentiment classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    /// Classification was not possible (empty text or stage failure).
    Unknown,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Sentiment classification with its underlying score.
///
/// The score is in `-1.0..=1.0`; the label is derived from it by fixed
/// thresholds in the sentiment stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: f64,
}

impl Sentiment {
    /// The marker value recorded when classification is unavailable.
    pub fn unknown() -> Self {
        Sentiment {
            label: SentimentLabel::Unknown,
            score: 0.0,
        }
    }
}

/// A news article flowing through the fetch-enrich pipeline.
///
/// # Fields
///
/// * `key` - Stable identity derived from the canonical URL; no two
///   articles in a final result share one
/// * `body` - `None` until extraction resolves it
/// * `summary` - `None` until the summarize stage runs (and stays `None`
///   when that stage is disabled or fails)
/// * `sentiment` - `None` when the stage is disabled; [`Sentiment::unknown`]
///   when it ran but could not classify
/// * `translated` - whether the translate stage replaced the text
/// * `language` - BCP-47-ish language code of the current title/body text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub key: String,
    pub url: String,
    pub title: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub snippet: String,
    pub body: Option<String>,
    pub summary: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub translated: bool,
    pub language: String,
}

impl Article {
    /// Build a fresh article from a search hit and its canonical key.
    ///
    /// Body and enrichment fields start empty; `language` records the
    /// language of the feed the hit came from.
    pub fn from_hit(hit: SearchHit, key: String, language: &str) -> Self {
        Article {
            key,
            url: hit.url,
            title: hit.title,
            source: hit.source,
            published_at: hit.published_at,
            snippet: hit.snippet,
            body: None,
            summary: None,
            sentiment: None,
            translated: false,
            language: language.to_string(),
        }
    }

    /// The text enrichment stages operate on: the extracted body when
    /// present, otherwise the snippet.
    pub fn text_for_enrichment(&self) -> &str {
        self.body.as_deref().unwrap_or(&self.snippet)
    }
}

/// Derive a short source tag from an article URL.
///
/// Returns the host with any `www.` prefix stripped, or `"unknown"` when
/// the URL does not parse.
pub fn host_tag(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Envelope for a full report export.
#[derive(Debug, Serialize, Deserialize)]
pub struct NewsReport {
    /// When this report was generated.
    pub generated_at: DateTime<Utc>,
    /// The topic that was searched.
    pub topic: String,
    pub total_articles: usize,
    pub articles: Vec<Article>,
}

impl NewsReport {
    pub fn new(topic: &str, articles: Vec<Article>) -> Self {
        NewsReport {
            generated_at: Utc::now(),
            topic: topic.to_string(),
            total_articles: articles.len(),
            articles,
        }
    }
}

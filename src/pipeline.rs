//! The fetch-enrich orchestrator.
//!
//! Turns a topic into an ordered set of enriched articles:
//!
//! 1. Search the provider for candidate hits (twice the requested limit,
//!    so dedup and filtering losses still leave a full page).
//! 2. Canonicalize URLs into article keys and drop duplicates.
//! 3. Fan extraction out across [`TURBO_WORKERS`] concurrent workers,
//!    each consulting the cache before fetching. Results are re-sorted
//!    so the output keeps first-seen order regardless of completion order.
//! 4. Apply the freshness filter and truncate to the limit.
//! 5. Enrich: one article's stages run in order (summarize, sentiment,
//!    translate), different articles enrich concurrently.
//!
//! Failure policy: a candidate whose extraction fails is dropped and
//! logged; an enrichment stage that fails marks its own field and leaves
//! the article in place. Only an empty final set surfaces as an error.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use futures::{stream, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::ai::Summarizer;
use crate::cache::ContentCache;
use crate::dedup::{canonical_url, Deduplicator};
use crate::errors::{ExtractionFailed, PipelineError};
use crate::extract::{extract_content, ExtractedPage, MIN_EXTRACTED_LENGTH};
use crate::fetcher::{FetchAsync, RetryFetch, FETCH_ATTEMPTS, FETCH_BASE_DELAY};
use crate::models::{host_tag, Article, SearchHit, Sentiment};
use crate::search::SearchNews;
use crate::sentiment;
use crate::translate::Translator;

/// Concurrent extraction workers.
pub const TURBO_WORKERS: usize = 10;

/// Shortest article text worth sending to the summarizer.
pub const MIN_SUMMARY_INPUT: usize = 100;

/// Recorded in place of a summary when the stage ran but failed.
pub const SUMMARY_UNAVAILABLE: &str = "[summary unavailable]";

/// Tuning knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Final article count cap.
    pub limit: usize,
    /// Recency window for the freshness filter.
    pub fresh_window: Duration,
    /// Whether articles without any discoverable timestamp pass the filter.
    pub include_undated: bool,
    /// Whether the sentiment stage runs.
    pub sentiment: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            limit: 10,
            fresh_window: Duration::hours(48),
            include_undated: false,
            sentiment: false,
        }
    }
}

/// Decide whether a publication timestamp passes the recency window.
///
/// The boundary is inclusive: an article published exactly `window` ago is
/// retained. Articles without a timestamp follow the configured policy.
pub fn is_fresh(
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
    include_undated: bool,
) -> bool {
    match published_at {
        Some(ts) => ts >= now - window,
        None => include_undated,
    }
}

/// The orchestrator, generic over the search provider and the page
/// retrieval so both can be substituted in tests.
#[derive(Debug)]
pub struct Pipeline<S, F> {
    search: S,
    fetch: F,
    cache: ContentCache,
    dedup: Deduplicator,
    summarizer: Option<Summarizer>,
    translator: Option<Translator>,
    language: String,
    config: PipelineConfig,
}

impl<S, F> Pipeline<S, F>
where
    S: SearchNews,
    F: FetchAsync<Response = String> + Clone + fmt::Debug,
{
    pub fn new(search: S, fetch: F, cache: ContentCache, config: PipelineConfig) -> Self {
        Pipeline {
            search,
            fetch,
            cache,
            dedup: Deduplicator::default(),
            summarizer: None,
            translator: None,
            language: "en".to_string(),
            config,
        }
    }

    /// Enable the summarize stage.
    pub fn with_summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Enable the translate stage.
    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Language code of the search feed, recorded on each article.
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Run the full pipeline for one topic.
    #[instrument(level = "info", skip_all, fields(topic = %topic))]
    pub async fn run(&self, topic: &str) -> Result<Vec<Article>, PipelineError> {
        let t0 = std::time::Instant::now();

        let hits = self
            .search
            .search(topic, self.config.limit.saturating_mul(2))
            .await?;
        info!(hits = hits.len(), "search returned candidates");

        let candidates = self.keyed_candidates(hits);
        let unique = self.dedup.dedup(candidates);
        info!(unique = unique.len(), "candidates after dedup");

        let mut articles = self.extract_all(unique).await;
        let extracted = articles.len();

        let now = Utc::now();
        articles.retain(|a| {
            is_fresh(
                a.published_at,
                now,
                self.config.fresh_window,
                self.config.include_undated,
            )
        });
        if articles.len() < extracted {
            info!(
                dropped = extracted - articles.len(),
                window_hours = self.config.fresh_window.num_hours(),
                "freshness filter applied"
            );
        }
        articles.truncate(self.config.limit);

        if articles.is_empty() {
            return Err(PipelineError::NoResults);
        }

        let articles = self.enrich_all(articles).await;

        info!(
            articles = articles.len(),
            elapsed_ms_total = t0.elapsed().as_millis() as u128,
            "pipeline complete"
        );
        Ok(articles)
    }

    /// Fetch and enrich one explicit URL, bypassing search and dedup.
    pub async fn run_single(&self, url: &str) -> Result<Article, ExtractionFailed> {
        let key = canonical_url(url).unwrap_or_else(|| url.to_string());
        let hit = SearchHit {
            title: String::new(),
            url: url.to_string(),
            snippet: String::new(),
            source: host_tag(url),
            published_at: None,
        };
        let mut article = Article::from_hit(hit, key, &self.language);

        let page = self.page_body(&article).await?;
        article.title = page.title.unwrap_or_else(|| host_tag(url));
        article.published_at = page.published_at;
        if !page.body.is_empty() {
            article.body = Some(page.body);
        }

        self.enrich(&mut article).await;
        Ok(article)
    }

    /// Attach canonical keys, dropping hits whose URL does not parse.
    fn keyed_candidates(&self, hits: Vec<SearchHit>) -> Vec<Article> {
        hits.into_iter()
            .filter_map(|hit| match canonical_url(&hit.url) {
                Some(key) => Some(Article::from_hit(hit, key, &self.language)),
                None => {
                    debug!(url = %hit.url, "dropping hit with unparseable url");
                    None
                }
            })
            .collect()
    }

    /// Concurrent extraction across the candidate list.
    ///
    /// Completion order is arbitrary; the index attached before fan-out
    /// restores first-seen order afterwards.
    async fn extract_all(&self, candidates: Vec<Article>) -> Vec<Article> {
        let mut tagged: Vec<(usize, Option<Article>)> =
            stream::iter(candidates.into_iter().enumerate())
                .map(|(idx, article)| async move { (idx, self.extract_one(article).await) })
                .buffer_unordered(TURBO_WORKERS)
                .collect()
                .await;
        tagged.sort_by_key(|(idx, _)| *idx);
        tagged.into_iter().filter_map(|(_, article)| article).collect()
    }

    async fn extract_one(&self, mut article: Article) -> Option<Article> {
        match self.page_body(&article).await {
            Ok(page) => {
                if article.published_at.is_none() {
                    article.published_at = page.published_at;
                }
                if !page.body.is_empty() {
                    article.body = Some(page.body);
                }
                Some(article)
            }
            Err(e) => {
                warn!(url = %article.url, error = %e, "dropping candidate, extraction failed");
                None
            }
        }
    }

    /// Resolve the article body: cache first, then fetch and extract.
    ///
    /// Extracted text below the minimum length comes back with an empty
    /// body (the caller keeps the snippet) and is not cached; a page with
    /// no extractable text at all is a failure.
    async fn page_body(&self, article: &Article) -> Result<ExtractedPage, ExtractionFailed> {
        if let Some(body) = self.cache.get(&article.key).await {
            return Ok(ExtractedPage {
                body,
                ..ExtractedPage::default()
            });
        }

        let retry = RetryFetch::new(self.fetch.clone(), FETCH_ATTEMPTS, FETCH_BASE_DELAY);
        let html = retry.fetch(&article.url).await?;
        let mut page = extract_content(&html);
        if page.body.is_empty() {
            return Err(ExtractionFailed::EmptyBody);
        }
        if page.body.len() < MIN_EXTRACTED_LENGTH {
            debug!(
                url = %article.url,
                len = page.body.len(),
                "extracted text too short, keeping the snippet"
            );
            page.body.clear();
        } else {
            self.cache.put(&article.key, &page.body).await;
        }
        Ok(page)
    }

    /// Enrichment across the final set: stages for one article run in
    /// sequence inside its task, different articles run concurrently.
    async fn enrich_all(&self, articles: Vec<Article>) -> Vec<Article> {
        let mut tagged: Vec<(usize, Article)> = stream::iter(articles.into_iter().enumerate())
            .map(|(idx, mut article)| async move {
                self.enrich(&mut article).await;
                (idx, article)
            })
            .buffer_unordered(TURBO_WORKERS)
            .collect()
            .await;
        tagged.sort_by_key(|(idx, _)| *idx);
        tagged.into_iter().map(|(_, article)| article).collect()
    }

    /// Run the enabled enrichment stages on one article.
    ///
    /// Each stage is isolated: a failure marks its own field and never
    /// removes the article or blocks the remaining stages.
    async fn enrich(&self, article: &mut Article) {
        if let Some(summarizer) = &self.summarizer {
            let text = article.text_for_enrichment();
            if text.len() < MIN_SUMMARY_INPUT {
                debug!(key = %article.key, len = text.len(), "text too short to summarize");
            } else {
                article.summary = Some(
                    summarizer
                        .summarize(text)
                        .await
                        .unwrap_or_else(|| SUMMARY_UNAVAILABLE.to_string()),
                );
            }
        }

        if self.config.sentiment {
            let text = article.text_for_enrichment();
            article.sentiment = Some(if text.trim().is_empty() {
                Sentiment::unknown()
            } else {
                sentiment::classify(text)
            });
        }

        if let Some(translator) = &self.translator {
            self.translate_article(translator, article).await;
        }
    }

    async fn translate_article(&self, translator: &Translator, article: &mut Article) {
        let mut changed = translate_field(translator, &mut article.title).await;
        if let Some(body) = article.body.as_mut() {
            changed |= translate_field(translator, body).await;
        }
        if let Some(summary) = article.summary.as_mut() {
            if summary != SUMMARY_UNAVAILABLE {
                changed |= translate_field(translator, summary).await;
            }
        }
        if changed {
            article.translated = true;
            article.language = translator.target_lang().to_string();
        }
    }
}

/// Translate one field in place; true when the text actually changed.
async fn translate_field(translator: &Translator, field: &mut String) -> bool {
    let translated = translator.translate_text(field).await;
    if translated.is_empty() || translated == *field {
        return false;
    }
    *field = translated;
    true
}

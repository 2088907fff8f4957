//! # News Turbo
//!
//! A topic-driven news pipeline that searches Google News, extracts full
//! article text concurrently, optionally enriches each article with AI
//! summaries, sentiment labels, and translations, and writes dated JSON,
//! CSV, and Markdown reports.
//!
//! ## Features
//!
//! - Google News RSS search with World and Indonesia editions
//! - Canonical-URL and fuzzy-title deduplication before any page is fetched
//! - Concurrent article extraction (10 at a time) with retry and backoff
//! - Disk cache for extracted bodies with a 48 hour TTL
//! - Optional enrichment: Groq summaries, lexicon sentiment, translation
//! - One-shot, single-URL, and watch modes
//!
//! ## Usage
//!
//! ```sh
//! news_turbo "quantum computing" -s --sentiment -j -m
//! news_turbo --url https://example.com/story -s
//! news_turbo bitcoin -w -i 15 -j
//! ```
//!
//! ## Architecture
//!
//! Each run is a pipeline:
//! 1. **Search**: query the region's Google News RSS feed
//! 2. **Dedup**: merge canonical-URL and near-duplicate-title hits
//! 3. **Extraction**: fetch and extract pages (parallel, 10 at a time)
//! 4. **Filter**: keep articles inside the freshness window, cap at the limit
//! 5. **Enrichment**: summarize, classify sentiment, translate per article
//! 6. **Output**: console digest plus JSON/CSV/Markdown report files

use chrono::Duration;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration as StdDuration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod ai;
mod cache;
mod cli;
mod dedup;
mod errors;
mod extract;
mod fetcher;
mod models;
mod outputs;
mod pipeline;
mod prompts;
mod search;
mod sentiment;
mod translate;
mod utils;
mod watch;

use ai::{ChatClient, Summarizer};
use cache::ContentCache;
use cli::Cli;
use errors::{ConfigError, PipelineError};
use fetcher::{PageFetcher, FETCH_TIMEOUT};
use models::{Article, NewsReport};
use outputs::ExportPlan;
use pipeline::{Pipeline, PipelineConfig};
use prompts::PromptBook;
use search::GoogleNewsRss;
use translate::Translator;
use watch::{ctrl_c_cancellation, WatchScheduler};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_turbo starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.topic, ?args.url, limit = args.limit, watch = args.watch, "Parsed CLI arguments");

    if let Err(e) = args.validate() {
        error!(error = %e, "Invalid arguments");
        return Err(e.into());
    }

    let cache = ContentCache::new(&args.cache_dir, Duration::hours(args.cache_ttl_hours));

    // --- Cache maintenance ---
    if args.clear_cache {
        let removed = cache.clear().await?;
        info!(removed, path = %args.cache_dir, "Cache cleared");
        if args.topic.is_none() && args.url.is_none() {
            return Ok(());
        }
    }

    // --- Assemble the pipeline ---
    let fetcher = PageFetcher::new(FETCH_TIMEOUT)?;
    let region = args.region();
    let search = GoogleNewsRss::new(fetcher.clone(), region);
    let config = PipelineConfig {
        limit: args.limit,
        fresh_window: Duration::hours(args.fresh_hours),
        include_undated: args.include_undated,
        sentiment: args.sentiment,
    };

    let summarizer = match (&args.groq_api_key, args.summary) {
        (Some(key), true) => {
            let prompts = PromptBook::load_or_default(Path::new("prompts.yaml"));
            let chat = ChatClient::new(fetcher.client().clone(), key.clone(), args.groq_model.clone());
            info!(model = %args.groq_model, "AI summarization enabled");
            Some(Summarizer::new(chat, prompts))
        }
        _ => None,
    };

    let mut pipeline = Pipeline::new(search, fetcher.clone(), cache, config)
        .with_language(region.language());
    if let Some(summarizer) = summarizer {
        pipeline = pipeline.with_summarizer(summarizer);
    }
    if args.translate {
        pipeline = pipeline.with_translator(Translator::new(fetcher, "id"));
    }

    let exports = ExportPlan::new(args.export_formats(), &args.output_dir);

    // --- Dispatch ---
    if let Some(url) = args.url.as_deref() {
        // ---- Single URL mode ----
        info!(url = %url, "Processing single URL");
        match pipeline.run_single(url).await {
            Ok(article) => {
                print_single(&article);
                let report = NewsReport::new(args.topic.as_deref().unwrap_or("news"), vec![article]);
                export_report(&exports, &report).await;
            }
            Err(e) => {
                error!(url = %url, error = %e, "Failed to process URL");
                return Err(e.into());
            }
        }
    } else {
        let Some(topic) = args.topic.as_deref() else {
            return Err(ConfigError::MissingTopic.into());
        };

        if args.watch {
            // ---- Watch mode ----
            let cancel = ctrl_c_cancellation();
            let mut scheduler =
                WatchScheduler::new(StdDuration::from_secs(args.interval.saturating_mul(60)));
            scheduler.run(&pipeline, topic, &exports, cancel).await;
        } else {
            // ---- One-shot search ----
            match pipeline.run(topic).await {
                Ok(articles) => {
                    println!("{} article(s) found for \"{topic}\"", articles.len());
                    print_digest(&articles);
                    let report = NewsReport::new(topic, articles);
                    export_report(&exports, &report).await;
                }
                Err(PipelineError::NoResults) => {
                    info!(topic = %topic, "No articles survived the filters");
                    println!("No fresh articles found for \"{topic}\".");
                }
                Err(e) => {
                    error!(topic = %topic, error = %e, "Pipeline run failed");
                    return Err(e.into());
                }
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Terminal digest of the top results, one block per article.
fn print_digest(articles: &[Article]) {
    for (i, article) in articles.iter().take(5).enumerate() {
        println!("\n{}. {}", i + 1, article.title);
        match article.published_at {
            Some(ts) => println!("   {} | {}", article.source, ts.format("%Y-%m-%d %H:%M UTC")),
            None => println!("   {} | date unknown", article.source),
        }
        if let Some(sentiment) = &article.sentiment {
            println!("   Sentiment: {} ({:.2})", sentiment.label, sentiment.score);
        }
        if let Some(summary) = &article.summary {
            println!("   -> {summary}");
        }
        println!("   {}", article.url);
    }
}

/// Full block for single-URL mode, tweet draft included.
fn print_single(article: &Article) {
    println!("\n{}", article.title);
    match article.published_at {
        Some(ts) => println!("{} | {}", article.source, ts.format("%Y-%m-%d %H:%M UTC")),
        None => println!("{} | date unknown", article.source),
    }
    if let Some(sentiment) = &article.sentiment {
        println!("Sentiment: {} ({:.2})", sentiment.label, sentiment.score);
    }
    if let Some(summary) = &article.summary {
        println!("\n{summary}");
    }
    println!("\nTweet draft:");
    println!("{}", outputs::markdown::tweet_draft(&article.title, &article.url));
    println!("\n{}", article.url);
}

/// Write whichever report files the export flags selected. Export failures
/// are logged, never fatal to the run.
async fn export_report(exports: &ExportPlan, report: &NewsReport) {
    if let Err(e) = exports.write_all(report).await {
        error!(error = %e, "Failed to write report files");
    }
}

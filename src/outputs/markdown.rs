//! Markdown digest export.
//!
//! The human-facing report: a header block, a sentiment overview when the
//! stage ran, and one section per article with source line, summary (or a
//! body excerpt), a ready-to-post tweet draft, and a Read More link.

use crate::models::{NewsReport, SentimentLabel};
use crate::utils::excerpt;
use itertools::Itertools;
use std::error::Error;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

/// Character budget for the per-article tweet draft.
pub const TWEET_LIMIT: usize = 280;

/// Body excerpt length used when an article has no summary.
const FALLBACK_EXCERPT: usize = 400;

/// Compose a draft post: the headline trimmed to leave room for the link.
pub(crate) fn tweet_draft(title: &str, url: &str) -> String {
    let budget = TWEET_LIMIT.saturating_sub(url.chars().count() + 1);
    format!("{} {}", excerpt(title, budget), url)
}

/// Render the digest without touching the filesystem.
pub fn render(report: &NewsReport) -> String {
    let mut md = String::new();
    writeln!(md, "# News digest: {}\n", report.topic).unwrap();
    writeln!(
        md,
        "Generated {} | {} article(s)\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.total_articles
    )
    .unwrap();

    let labels: Vec<SentimentLabel> = report
        .articles
        .iter()
        .filter_map(|a| a.sentiment.map(|s| s.label))
        .collect();
    if !labels.is_empty() {
        let counts = labels.iter().copied().counts();
        writeln!(md, "## Sentiment overview\n").unwrap();
        for label in [
            SentimentLabel::Positive,
            SentimentLabel::Negative,
            SentimentLabel::Neutral,
            SentimentLabel::Unknown,
        ] {
            if let Some(n) = counts.get(&label) {
                writeln!(md, "- {label}: {n}").unwrap();
            }
        }
        writeln!(md).unwrap();
    }

    for (idx, article) in report.articles.iter().enumerate() {
        writeln!(md, "## {}. {}\n", idx + 1, article.title).unwrap();

        let published = article
            .published_at
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        writeln!(md, "*{}* | {}\n", article.source, published).unwrap();

        if let Some(s) = article.sentiment {
            writeln!(md, "Sentiment: {} ({:.2})\n", s.label, s.score).unwrap();
        }

        match &article.summary {
            Some(summary) => writeln!(md, "{summary}\n").unwrap(),
            None => writeln!(md, "{}\n", excerpt(article.text_for_enrichment(), FALLBACK_EXCERPT))
                .unwrap(),
        }

        writeln!(md, "> {}\n", tweet_draft(&article.title, &article.url)).unwrap();
        writeln!(md, "[Read More]({})\n", article.url).unwrap();
    }

    md
}

/// Write the digest to `path`.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn write_report(report: &NewsReport, path: &str) -> Result<(), Box<dyn Error>> {
    fs::write(path, render(report)).await?;
    info!(articles = report.total_articles, "Wrote Markdown report");
    Ok(())
}

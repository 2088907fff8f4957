//! CSV report export, one row per article.
//!
//! Fields containing a delimiter, quote, or line break are quoted with
//! doubled inner quotes, per RFC 4180. Sentiment renders as
//! `Label (score)`; fields for stages that did not run stay empty.

use crate::models::{Article, NewsReport};
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

const HEADER: &str = "title,source,url,published_at,sentiment,summary";

/// Quote a field when it contains a delimiter, quote, or line break.
fn escape(field: &str) -> String {
    if field.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn sentiment_cell(article: &Article) -> String {
    match article.sentiment {
        Some(s) => format!("{} ({:.2})", s.label, s.score),
        None => String::new(),
    }
}

/// Render header and rows without touching the filesystem.
pub fn render(report: &NewsReport) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for article in &report.articles {
        let published = article
            .published_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let row = [
            escape(&article.title),
            escape(&article.source),
            escape(&article.url),
            published,
            escape(&sentiment_cell(article)),
            escape(article.summary.as_deref().unwrap_or("")),
        ]
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out
}

/// Write the report rows to `path`.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn write_report(report: &NewsReport, path: &str) -> Result<(), Box<dyn Error>> {
    fs::write(path, render(report)).await?;
    info!(articles = report.total_articles, "Wrote CSV report");
    Ok(())
}

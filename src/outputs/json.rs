//! JSON report export.
//!
//! Serializes the full [`NewsReport`] envelope, pretty-printed, for
//! consumption by downstream tooling. Every article field survives the
//! round trip, including enrichment markers.

use crate::models::NewsReport;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Write the report envelope to `path` as pretty-printed JSON.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn write_report(report: &NewsReport, path: &str) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).await?;
    info!(articles = report.total_articles, "Wrote JSON report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, SearchHit, Sentiment, SentimentLabel};
    use chrono::Utc;

    #[tokio::test]
    async fn report_round_trips_through_the_file() {
        let hit = SearchHit {
            title: "Satellite launch succeeds".to_string(),
            url: "https://example.com/launch".to_string(),
            snippet: "Launch went well.".to_string(),
            source: "Example Wire".to_string(),
            published_at: Some(Utc::now()),
        };
        let mut article = Article::from_hit(hit, "example.com/launch".to_string(), "en");
        article.sentiment = Some(Sentiment {
            label: SentimentLabel::Positive,
            score: 0.6,
        });
        let report = NewsReport::new("satellite", vec![article]);

        let path = std::env::temp_dir()
            .join(format!("news_turbo_json_test_{}.json", std::process::id()));
        let path_str = path.to_string_lossy().into_owned();
        write_report(&report, &path_str).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let back: NewsReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.topic, "satellite");
        assert_eq!(back.total_articles, 1);
        assert_eq!(back.articles[0].key, "example.com/launch");
        assert_eq!(
            back.articles[0].sentiment.unwrap().label,
            SentimentLabel::Positive
        );
        let _ = std::fs::remove_file(&path);
    }
}

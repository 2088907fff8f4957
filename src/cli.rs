//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials can be provided via command-line flags or environment
//! variables.

use clap::Parser;

use crate::ai::DEFAULT_MODEL;
use crate::errors::ConfigError;
use crate::outputs::ExportFormats;
use crate::search::Region;
use crate::watch::DEFAULT_WATCH_INTERVAL_MIN;

/// Command-line arguments for the news pipeline.
///
/// The topic is positional; enrichment stages, export formats, and watch
/// mode are opt-in flags.
///
/// # Examples
///
/// ```sh
/// # Ten fresh articles on a topic
/// news_turbo "bitcoin"
///
/// # Indonesian edition with translation and summaries
/// news_turbo "pemilu 2029" --indo -t -s
///
/// # Watch mode: JSON reports every 15 minutes
/// news_turbo "bitcoin" -w -i 15 -j
///
/// # One specific article instead of a search
/// news_turbo -u https://example.com/story --sentiment
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search topic, e.g. "bitcoin" or "pemilu 2029"
    pub topic: Option<String>,

    /// Use the Indonesian news edition instead of the world edition
    #[arg(long)]
    pub indo: bool,

    /// Translate titles, bodies, and summaries into Indonesian
    #[arg(short, long)]
    pub translate: bool,

    /// Summarize each article with the chat model
    #[arg(short, long)]
    pub summary: bool,

    /// Classify each article's sentiment
    #[arg(long)]
    pub sentiment: bool,

    /// Maximum number of articles in the final result
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Write a JSON report
    #[arg(short, long)]
    pub json: bool,

    /// Write a CSV report
    #[arg(short, long)]
    pub csv: bool,

    /// Write a Markdown report
    #[arg(short, long)]
    pub markdown: bool,

    /// Re-run the search on an interval, reporting only new articles
    #[arg(short, long)]
    pub watch: bool,

    /// Minutes between watch cycles
    #[arg(short, long, default_value_t = DEFAULT_WATCH_INTERVAL_MIN)]
    pub interval: u64,

    /// Remove all cached article bodies and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Process one article URL instead of searching
    #[arg(short, long)]
    pub url: Option<String>,

    /// Keep articles whose publication date cannot be determined
    #[arg(long)]
    pub include_undated: bool,

    /// Recency window in hours for the freshness filter
    #[arg(long, default_value_t = 48)]
    pub fresh_hours: i64,

    /// Hours before a cached article body counts as stale
    #[arg(long, default_value_t = 48)]
    pub cache_ttl_hours: i64,

    /// Directory for cached article bodies
    #[arg(long, default_value = ".cache")]
    pub cache_dir: String,

    /// Base directory for report files
    #[arg(long, default_value = "reports")]
    pub output_dir: String,

    /// API key for the chat model provider
    #[arg(long, env = "GROQ_API_KEY")]
    pub groq_api_key: Option<String>,

    /// Chat model used for summaries
    #[arg(long, env = "GROQ_MODEL", default_value = DEFAULT_MODEL)]
    pub groq_model: String,
}

impl Cli {
    /// Reject argument combinations that cannot run.
    ///
    /// Summaries need a provider credential; every mode except `--url` and
    /// `--clear-cache` needs a topic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.summary && self.groq_api_key.is_none() {
            return Err(ConfigError::MissingCredential {
                feature: "summarization",
                var: "GROQ_API_KEY",
            });
        }
        if self.topic.is_none() && self.url.is_none() && !self.clear_cache {
            return Err(ConfigError::MissingTopic);
        }
        Ok(())
    }

    pub fn region(&self) -> Region {
        if self.indo {
            Region::Indonesia
        } else {
            Region::World
        }
    }

    pub fn export_formats(&self) -> ExportFormats {
        ExportFormats {
            json: self.json,
            csv: self.csv,
            markdown: self.markdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            topic: Some("bitcoin".to_string()),
            indo: false,
            translate: false,
            summary: false,
            sentiment: false,
            limit: 10,
            json: false,
            csv: false,
            markdown: false,
            watch: false,
            interval: DEFAULT_WATCH_INTERVAL_MIN,
            clear_cache: false,
            url: None,
            include_undated: false,
            fresh_hours: 48,
            cache_ttl_hours: 48,
            cache_dir: ".cache".to_string(),
            output_dir: "reports".to_string(),
            groq_api_key: None,
            groq_model: DEFAULT_MODEL.to_string(),
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["news_turbo", "bitcoin"]);
        assert_eq!(cli.topic.as_deref(), Some("bitcoin"));
        assert_eq!(cli.limit, 10);
        assert_eq!(cli.interval, 30);
        assert_eq!(cli.fresh_hours, 48);
        assert!(!cli.watch);
        assert!(!cli.indo);
        assert!(!cli.export_formats().any());
        assert_eq!(cli.cache_dir, ".cache");
        assert_eq!(cli.output_dir, "reports");
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["news_turbo", "pemilu", "--indo", "-t", "-s", "-l", "5", "-j", "-w", "-i", "15"]);
        assert_eq!(cli.topic.as_deref(), Some("pemilu"));
        assert!(cli.indo);
        assert!(cli.translate);
        assert!(cli.summary);
        assert_eq!(cli.limit, 5);
        assert!(cli.json);
        assert!(cli.watch);
        assert_eq!(cli.interval, 15);
        assert!(matches!(cli.region(), Region::Indonesia));
    }

    #[test]
    fn test_cli_url_mode_needs_no_topic() {
        let cli = Cli::parse_from(["news_turbo", "-u", "https://example.com/story"]);
        assert!(cli.topic.is_none());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_topic() {
        let mut cli = base_cli();
        cli.topic = None;
        assert!(matches!(cli.validate(), Err(ConfigError::MissingTopic)));

        cli.clear_cache = true;
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_credential_for_summaries() {
        let mut cli = base_cli();
        cli.summary = true;
        cli.groq_api_key = None;
        assert!(matches!(
            cli.validate(),
            Err(ConfigError::MissingCredential { var: "GROQ_API_KEY", .. })
        ));

        cli.groq_api_key = Some("gsk_test".to_string());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_export_formats_map_flags() {
        let cli = Cli::parse_from(["news_turbo", "bitcoin", "-j", "-c", "-m"]);
        let formats = cli.export_formats();
        assert!(formats.json && formats.csv && formats.markdown);
    }
}

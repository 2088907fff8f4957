//! HTML to article text extraction.
//!
//! Works on any news page rather than one outlet's markup: a ladder of
//! container selectors is tried in order and the first one yielding enough
//! paragraph text wins, falling back to every `<p>` on the page. Page
//! metadata (`og:title`, `article:published_time`) refines the title and
//! published timestamp when present.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// Extractions shorter than this are considered too thin to be an article.
pub const MIN_EXTRACTED_LENGTH: usize = 200;

static PARAGRAPH_LADDER: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article p",
        "main p",
        r#"div[itemprop="articleBody"] p"#,
        ".article-body p, .story-body p, .post-content p",
        "body p",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static TITLE_META: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static TITLE_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static PUBLISHED_META: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"meta[property="article:published_time"]"#,
        r#"meta[name="article:published_time"]"#,
        r#"meta[itemprop="datePublished"]"#,
        r#"meta[name="date"]"#,
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});
static TIME_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("time[datetime]").unwrap());

/// What a raw page boils down to.
#[derive(Debug, Default)]
pub struct ExtractedPage {
    /// Cleaned paragraph text, empty when nothing usable was found.
    pub body: String,
    /// Canonical title from page metadata, when present.
    pub title: Option<String>,
    /// Published timestamp from page metadata, when present and parseable.
    pub published_at: Option<DateTime<Utc>>,
}

/// Extract cleaned article text and metadata from a raw HTML page.
pub fn extract_content(html: &str) -> ExtractedPage {
    let doc = Html::parse_document(html);

    let mut best = String::new();
    for selector in PARAGRAPH_LADDER.iter() {
        let text = collect_paragraphs(&doc, selector);
        if text.len() >= MIN_EXTRACTED_LENGTH {
            best = text;
            break;
        }
        if text.len() > best.len() {
            best = text;
        }
    }

    ExtractedPage {
        body: best,
        title: page_title(&doc),
        published_at: page_published(&doc),
    }
}

fn collect_paragraphs(doc: &Html, selector: &Selector) -> String {
    doc.select(selector)
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn page_title(doc: &Html) -> Option<String> {
    if let Some(meta) = doc.select(&TITLE_META).next() {
        if let Some(content) = meta.value().attr("content") {
            let title = content.trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    doc.select(&TITLE_TAG)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn page_published(doc: &Html) -> Option<DateTime<Utc>> {
    for selector in PUBLISHED_META.iter() {
        if let Some(el) = doc.select(selector).next() {
            if let Some(parsed) = el.value().attr("content").and_then(parse_timestamp) {
                return Some(parsed);
            }
        }
    }
    doc.select(&TIME_TAG)
        .next()
        .and_then(|el| el.value().attr("datetime"))
        .and_then(parse_timestamp)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

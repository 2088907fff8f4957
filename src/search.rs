//! Topic search via the Google News RSS feed.
//!
//! One bounded query per run: the topic is percent-encoded into the feed
//! URL for the configured regional edition, the feed is fetched through the
//! retrying fetcher, and the items are parsed into [`SearchHit`]s. Google
//! News puts the publisher into the item title as `"Headline - Source"`,
//! so titles are split and cleaned here.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{info, instrument};

use crate::errors::SearchError;
use crate::fetcher::{fetch_with_backoff, PageFetcher};
use crate::models::{host_tag, SearchHit};

/// Regional edition of the search provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    World,
    Indonesia,
}

impl Region {
    /// `(hl, gl, ceid)` parameters selecting the feed edition.
    fn feed_params(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Region::World => ("en-US", "US", "US:en"),
            Region::Indonesia => ("id", "ID", "ID:id"),
        }
    }

    /// Language code of the headlines this edition serves.
    pub fn language(self) -> &'static str {
        match self {
            Region::World => "en",
            Region::Indonesia => "id",
        }
    }
}

/// A provider that turns a query into candidate articles.
///
/// The pipeline treats the returned hit list as an opaque, possibly
/// unordered, possibly duplicated input stream.
pub trait SearchNews {
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<SearchHit>, SearchError>;
}

/// Google News RSS search.
#[derive(Debug, Clone)]
pub struct GoogleNewsRss {
    fetcher: PageFetcher,
    region: Region,
    base_url: String,
}

impl GoogleNewsRss {
    pub fn new(fetcher: PageFetcher, region: Region) -> Self {
        GoogleNewsRss {
            fetcher,
            region,
            base_url: "https://news.google.com/rss/search".to_string(),
        }
    }

    fn query_url(&self, query: &str) -> String {
        let (hl, gl, ceid) = self.region.feed_params();
        format!(
            "{}?q={}&hl={}&gl={}&ceid={}",
            self.base_url,
            urlencoding::encode(query),
            hl,
            gl,
            ceid
        )
    }
}

impl SearchNews for GoogleNewsRss {
    #[instrument(level = "info", skip_all, fields(query = %query))]
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let url = self.query_url(query);
        let xml = fetch_with_backoff(&self.fetcher, &url).await?;
        let mut hits = parse_feed(&xml)?;
        hits.truncate(max_results);
        info!(count = hits.len(), "search feed parsed");
        Ok(hits)
    }
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
    Source,
}

#[derive(Default)]
struct RawItem {
    title: String,
    link: String,
    description: String,
    pub_date: String,
    source: String,
}

impl RawItem {
    fn push(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
            Field::Source => &mut self.source,
        };
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(text);
    }

    fn into_hit(self) -> Option<SearchHit> {
        if self.title.is_empty() || self.link.is_empty() {
            return None;
        }
        let (clean_title, title_source) = split_source_suffix(&self.title);
        let source = if !self.source.is_empty() {
            self.source
        } else {
            title_source.unwrap_or_else(|| host_tag(&self.link))
        };
        Some(SearchHit {
            title: clean_title,
            snippet: strip_html(&self.description),
            source,
            published_at: parse_pub_date(&self.pub_date),
            url: self.link,
        })
    }
}

/// Parse an RSS 2.0 feed into search hits, skipping items without a title
/// or link.
fn parse_feed(xml: &str) -> Result<Vec<SearchHit>, SearchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut hits = Vec::new();
    let mut in_item = false;
    let mut field: Option<Field> = None;
    let mut current = RawItem::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => {
                    in_item = true;
                    current = RawItem::default();
                }
                b"title" if in_item => field = Some(Field::Title),
                b"link" if in_item => field = Some(Field::Link),
                b"description" if in_item => field = Some(Field::Description),
                b"pubDate" if in_item => field = Some(Field::PubDate),
                b"source" if in_item => field = Some(Field::Source),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(f) = field {
                    let text = t
                        .unescape()
                        .map_err(|e| SearchError::Parse(e.to_string()))?;
                    current.push(f, &text);
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(f) = field {
                    current.push(f, &String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    in_item = false;
                    if let Some(hit) = std::mem::take(&mut current).into_hit() {
                        hits.push(hit);
                    }
                } else {
                    field = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SearchError::Parse(e.to_string())),
            _ => {}
        }
    }
    Ok(hits)
}

/// Split the `"Headline - Source"` form Google News uses for item titles.
fn split_source_suffix(title: &str) -> (String, Option<String>) {
    match title.rfind(" - ") {
        Some(pos) => (
            title[..pos].trim().to_string(),
            Some(title[pos + 3..].trim().to_string()),
        ),
        None => (title.trim().to_string(), None),
    }
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Strip tags and common entities from a feed description.
fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>"bitcoin" - Google News</title>
<link>https://news.google.com/search</link>
<item>
  <title>Bitcoin climbs past $100,000 - CoinDesk</title>
  <link>https://www.coindesk.com/markets/2026/08/20/bitcoin-climbs</link>
  <pubDate>Thu, 20 Aug 2026 14:05:00 GMT</pubDate>
  <description><![CDATA[<a href="https://x">Bitcoin climbs</a>&nbsp;after ETF inflows hit a record.]]></description>
  <source url="https://www.coindesk.com">CoinDesk</source>
</item>
<item>
  <title>Miners expand capacity in Texas - Reuters</title>
  <link>https://www.reuters.com/technology/miners-expand</link>
  <pubDate>Wed, 19 Aug 2026 09:00:00 GMT</pubDate>
  <description>Mining firms announced new sites.</description>
  <source url="https://www.reuters.com">Reuters</source>
</item>
<item>
  <title>Item without a link is dropped</title>
  <pubDate>Wed, 19 Aug 2026 09:00:00 GMT</pubDate>
</item>
</channel></rss>"#;

    #[test]
    fn parses_items_with_clean_titles_and_sources() {
        let hits = parse_feed(SAMPLE_FEED).unwrap();
        assert_eq!(hits.len(), 2);

        assert_eq!(hits[0].title, "Bitcoin climbs past $100,000");
        assert_eq!(hits[0].source, "CoinDesk");
        assert_eq!(
            hits[0].url,
            "https://www.coindesk.com/markets/2026/08/20/bitcoin-climbs"
        );
        assert_eq!(
            hits[0].published_at,
            Some(Utc.with_ymd_and_hms(2026, 8, 20, 14, 5, 0).unwrap())
        );
        assert_eq!(
            hits[0].snippet,
            "Bitcoin climbs after ETF inflows hit a record."
        );

        assert_eq!(hits[1].title, "Miners expand capacity in Texas");
        assert_eq!(hits[1].source, "Reuters");
    }

    #[test]
    fn source_falls_back_to_title_suffix_then_host() {
        let xml = r#"<rss><channel><item>
            <title>Some headline - The Verge</title>
            <link>https://www.theverge.com/a</link>
        </item><item>
            <title>Suffix-free headline</title>
            <link>https://www.example.org/b</link>
        </item></channel></rss>"#;
        let hits = parse_feed(xml).unwrap();
        assert_eq!(hits[0].source, "The Verge");
        assert_eq!(hits[1].source, "example.org");
        assert_eq!(hits[1].title, "Suffix-free headline");
    }

    #[test]
    fn region_selects_feed_edition() {
        let fetcher = PageFetcher::new(std::time::Duration::from_secs(1)).unwrap();
        let world = GoogleNewsRss::new(fetcher.clone(), Region::World);
        let indo = GoogleNewsRss::new(fetcher, Region::Indonesia);

        let world_url = world.query_url("climate change");
        assert!(world_url.contains("q=climate%20change"));
        assert!(world_url.contains("hl=en-US"));
        assert!(world_url.contains("ceid=US:en"));

        let indo_url = indo.query_url("pemilu");
        assert!(indo_url.contains("hl=id"));
        assert!(indo_url.contains("gl=ID"));
        assert!(indo_url.contains("ceid=ID:id"));
    }

    #[test]
    fn pub_date_parses_both_common_formats() {
        assert_eq!(
            parse_pub_date("Thu, 20 Aug 2026 14:05:00 GMT"),
            Some(Utc.with_ymd_and_hms(2026, 8, 20, 14, 5, 0).unwrap())
        );
        assert_eq!(
            parse_pub_date("2026-08-20T14:05:00Z"),
            Some(Utc.with_ymd_and_hms(2026, 8, 20, 14, 5, 0).unwrap())
        );
        assert_eq!(parse_pub_date(""), None);
        assert_eq!(parse_pub_date("yesterday-ish"), None);
    }

    #[test]
    fn strip_html_removes_tags_and_entities() {
        assert_eq!(
            strip_html("<b>Bold</b>&nbsp;&amp;&nbsp;<i>quiet</i>"),
            "Bold & quiet"
        );
    }
}

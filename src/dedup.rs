//! Duplicate-story detection.
//!
//! Identity is two-layered. The canonical URL is authoritative: two hits
//! with the same canonical URL are always the same story, whatever their
//! titles look like. Below that, near-match title comparison catches the
//! same story syndicated under different URLs: titles are normalized
//! (lowercased, punctuation stripped, whitespace collapsed) and scored with
//! Jaro-Winkler against every already-accepted representative.
//!
//! The pass is quadratic in the candidate count, which is fine at the
//! bounded result sizes a single query produces (tens to low hundreds).

use std::collections::HashMap;
use strsim::jaro_winkler;
use tracing::debug;
use url::Url;

use crate::models::Article;

/// Similarity at or above this treats two titles as the same story.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Reduce a raw link to its canonical form, the article key.
///
/// Scheme and host are lowercased by the parser; the fragment, default
/// port, tracking query parameters, and any trailing slash are dropped.
/// Meaningful query parameters survive. Returns `None` when the input does
/// not parse as a URL.
pub fn canonical_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
    }
    if kept.is_empty() {
        url.set_query(None);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_")
        || matches!(
            key,
            "fbclid" | "gclid" | "msclkid" | "igshid" | "mc_cid" | "mc_eid"
        )
}

/// Normalize a title for similarity comparison: lowercase, strip
/// punctuation, collapse whitespace.
pub fn normalize_title(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drops candidates that duplicate an already-accepted story.
///
/// First occurrence wins as canonical; output preserves first-seen order.
/// Running the pass on its own output changes nothing.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    threshold: f64,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Deduplicator {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Self {
        Deduplicator { threshold }
    }

    /// Reduce an ordered candidate list to its representatives.
    pub fn dedup(&self, candidates: Vec<Article>) -> Vec<Article> {
        let mut accepted: Vec<Article> = Vec::with_capacity(candidates.len());
        let mut seen_keys: HashMap<String, usize> = HashMap::new();
        let mut norm_titles: Vec<String> = Vec::new();

        for candidate in candidates {
            if let Some(&idx) = seen_keys.get(&candidate.key) {
                debug!(
                    key = %candidate.key,
                    kept = %accepted[idx].title,
                    "duplicate by canonical url"
                );
                continue;
            }

            let norm = normalize_title(&candidate.title);
            let near_match = norm_titles
                .iter()
                .enumerate()
                .map(|(idx, existing)| (idx, jaro_winkler(&norm, existing)))
                .find(|(_, score)| *score >= self.threshold);
            if let Some((idx, score)) = near_match {
                debug!(
                    dropped = %candidate.title,
                    kept = %accepted[idx].title,
                    score,
                    "duplicate by title similarity"
                );
                continue;
            }

            seen_keys.insert(candidate.key.clone(), accepted.len());
            norm_titles.push(norm);
            accepted.push(candidate);
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(key: &str, title: &str) -> Article {
        Article {
            key: key.to_string(),
            url: format!("https://{key}"),
            title: title.to_string(),
            source: "test".to_string(),
            published_at: None,
            snippet: String::new(),
            body: None,
            summary: None,
            sentiment: None,
            translated: false,
            language: "en".to_string(),
        }
    }

    #[test]
    fn canonical_url_strips_tracking_and_fragment() {
        let got = canonical_url(
            "https://Example.com/story/?utm_source=x&utm_medium=social&fbclid=abc#section",
        )
        .unwrap();
        assert_eq!(got, "https://example.com/story");
    }

    #[test]
    fn canonical_url_keeps_meaningful_query() {
        let got = canonical_url("https://example.com/watch?v=dQw4w9&utm_campaign=x").unwrap();
        assert_eq!(got, "https://example.com/watch?v=dQw4w9");
    }

    #[test]
    fn canonical_url_trims_trailing_slash_but_not_root() {
        assert_eq!(
            canonical_url("https://example.com/a/b/").unwrap(),
            "https://example.com/a/b"
        );
        assert_eq!(
            canonical_url("https://example.com/").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn canonical_url_rejects_garbage() {
        assert_eq!(canonical_url("definitely not a url"), None);
    }

    #[test]
    fn normalize_title_lowercases_and_strips_punctuation() {
        assert_eq!(
            normalize_title("Bitcoin Surges Past $100K!"),
            "bitcoin surges past 100k"
        );
        assert_eq!(normalize_title("  Lots\t of\n space  "), "lots of space");
    }

    #[test]
    fn near_identical_titles_merge() {
        let out = Deduplicator::default().dedup(vec![
            article("a.com/1", "Bitcoin surges past $100,000 mark"),
            article("b.com/2", "Bitcoin Surges Past $100,000 Mark!"),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "a.com/1");
    }

    #[test]
    fn distinct_stories_survive() {
        let out = Deduplicator::default().dedup(vec![
            article("a.com/1", "Bitcoin surges past $100,000"),
            article("b.com/2", "Ethereum upgrade ships next quarter"),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn url_identity_dominates_title_similarity() {
        // same canonical key, wildly different titles: still one story
        let out = Deduplicator::default().dedup(vec![
            article("a.com/story", "Markets slide on inflation data"),
            article("a.com/story", "A completely unrelated headline"),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Markets slide on inflation data");
    }

    #[test]
    fn first_seen_wins_and_order_is_preserved() {
        let out = Deduplicator::default().dedup(vec![
            article("a.com/1", "Fed holds rates steady in June"),
            article("b.com/2", "Oil prices climb amid supply worries"),
            article("c.com/3", "Fed Holds Rates Steady in June"),
            article("d.com/4", "New exchange listing announced today"),
        ]);
        let keys: Vec<&str> = out.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["a.com/1", "b.com/2", "d.com/4"]);
    }

    #[test]
    fn dedup_is_idempotent() {
        let dedup = Deduplicator::default();
        let once = dedup.dedup(vec![
            article("a.com/1", "Fed holds rates steady"),
            article("b.com/2", "Fed holds rates steady!"),
            article("c.com/3", "Completely different story"),
        ]);
        let titles: Vec<String> = once.iter().map(|a| a.title.clone()).collect();
        let twice = dedup.dedup(once);
        let titles_again: Vec<String> = twice.iter().map(|a| a.title.clone()).collect();
        assert_eq!(titles, titles_again);
    }

    #[test]
    fn threshold_is_tunable() {
        let strict = Deduplicator::new(0.999);
        let out = strict.dedup(vec![
            article("a.com/1", "Bitcoin surges past $100,000 mark"),
            article("b.com/2", "Bitcoin surges past $100,000 marks"),
        ]);
        assert_eq!(out.len(), 2, "near-but-not-exact titles survive at 0.999");
    }
}

//! Best-effort translation through the public `gtx` endpoint.
//!
//! Text is split into paragraph-aligned chunks under the request size cap
//! and each chunk is translated independently. A chunk whose request or
//! parse fails is kept in the original language, so a flaky endpoint
//! degrades the output instead of losing it.

use tracing::warn;

use crate::fetcher::{fetch_with_backoff, PageFetcher};

/// Byte cap per translation request.
pub const TRANSLATE_CHUNK_LIMIT: usize = 4500;

#[derive(Debug, Clone)]
pub struct Translator {
    fetcher: PageFetcher,
    target_lang: String,
}

impl Translator {
    pub fn new(fetcher: PageFetcher, target_lang: impl Into<String>) -> Self {
        Translator {
            fetcher,
            target_lang: target_lang.into(),
        }
    }

    /// Language code articles end up in.
    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// Translate `text` paragraph-wise into the target language.
    ///
    /// Chunks that cannot be translated come back unchanged.
    pub async fn translate_text(&self, text: &str) -> String {
        let chunks = chunk_paragraphs(text, TRANSLATE_CHUNK_LIMIT);
        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match self.translate_chunk(&chunk).await {
                Some(t) => translated.push(t),
                None => {
                    warn!(len = chunk.len(), "translation failed; keeping original chunk");
                    translated.push(chunk);
                }
            }
        }
        translated.join("\n\n")
    }

    async fn translate_chunk(&self, chunk: &str) -> Option<String> {
        let url = endpoint_url(&self.target_lang, chunk);
        let body = fetch_with_backoff(&self.fetcher, &url).await.ok()?;
        parse_translation(&body)
    }
}

/// Group paragraphs into chunks no longer than `limit` bytes.
///
/// A single paragraph over the limit is emitted alone rather than split
/// mid-sentence.
fn chunk_paragraphs(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for para in text.split("\n\n") {
        if para.trim().is_empty() {
            continue;
        }
        if !current.is_empty() && current.len() + 2 + para.len() > limit {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(para);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn endpoint_url(target_lang: &str, chunk: &str) -> String {
    format!(
        "https://translate.googleapis.com/translate_a/single?client=gtx&sl=auto&tl={}&dt=t&q={}",
        target_lang,
        urlencoding::encode(chunk)
    )
}

/// Pull the translated segments out of the endpoint's nested-array reply.
fn parse_translation(json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    let segments = value.get(0)?.as_array()?;
    let mut out = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(|v| v.as_str()) {
            out.push_str(piece);
        }
    }
    if out.trim().is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_paragraphs_share_a_chunk() {
        let chunks = chunk_paragraphs("one\n\ntwo\n\nthree", 50);
        assert_eq!(chunks, vec!["one\n\ntwo\n\nthree".to_string()]);
    }

    #[test]
    fn chunks_split_at_the_byte_limit() {
        let chunks = chunk_paragraphs("aaaaaaaaaa\n\nbbbbbbbbbb\n\ncccccccccc", 24);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "aaaaaaaaaa\n\nbbbbbbbbbb");
        assert_eq!(chunks[1], "cccccccccc");
    }

    #[test]
    fn oversize_paragraph_stands_alone() {
        let big = "x".repeat(100);
        let chunks = chunk_paragraphs(&format!("small\n\n{big}\n\ntail"), 40);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "small");
        assert_eq!(chunks[1], big);
        assert_eq!(chunks[2], "tail");
    }

    #[test]
    fn blank_paragraphs_are_skipped() {
        let chunks = chunk_paragraphs("one\n\n   \n\ntwo", 100);
        assert_eq!(chunks, vec!["one\n\ntwo".to_string()]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_paragraphs("", 100).is_empty());
    }

    #[test]
    fn endpoint_url_carries_lang_and_encoded_query() {
        let url = endpoint_url("id", "hello world");
        assert!(url.contains("tl=id"));
        assert!(url.contains("q=hello%20world"));
        assert!(url.starts_with("https://translate.googleapis.com/"));
    }

    #[test]
    fn parses_segments_from_the_reply() {
        let json = r#"[[["Halo dunia. ","Hello world. ",null,null,3],
                        ["Apa kabar?","How are you?",null,null,3]],null,"en"]"#;
        assert_eq!(
            parse_translation(json),
            Some("Halo dunia. Apa kabar?".to_string())
        );
    }

    #[test]
    fn malformed_replies_are_rejected() {
        assert_eq!(parse_translation("not json"), None);
        assert_eq!(parse_translation("{}"), None);
        assert_eq!(parse_translation(r#"[[],null,"en"]"#), None);
    }
}

//! Lexicon-based sentiment scoring for article text.
//!
//! Deliberately cheap: counts positive and negative cue words in the
//! opening window of the text and maps the balance onto a label. No
//! model calls, no network.

use crate::models::{Sentiment, SentimentLabel};

/// How many characters of the text participate in scoring.
const SENTIMENT_WINDOW: usize = 1000;

/// Score above which text is labelled positive, below the negation
/// of which it is labelled negative.
const LABEL_THRESHOLD: f64 = 0.1;

const POSITIVE_WORDS: &[&str] = &[
    "gain", "surge", "rally", "growth", "profit", "success", "boost",
    "record", "breakthrough", "soar", "strong", "rise", "improve",
    "optimis", "recover", "upbeat", "approval", "milestone", "expand",
];

const NEGATIVE_WORDS: &[&str] = &[
    "loss", "crash", "drop", "decline", "fall", "fail", "crisis",
    "fraud", "lawsuit", "scandal", "fear", "risk", "warn", "plunge",
    "layoff", "recession", "weak", "hack", "breach", "slump",
];

/// Balance of cue words in `[-1.0, 1.0]`; `0.0` when no cue word occurs.
fn score(text: &str) -> f64 {
    let window: String = text.chars().take(SENTIMENT_WINDOW).collect();
    let lower = window.to_lowercase();

    let mut positive = 0usize;
    let mut negative = 0usize;
    for word in lower.split_whitespace() {
        if POSITIVE_WORDS.iter().any(|cue| word.contains(cue)) {
            positive += 1;
        }
        if NEGATIVE_WORDS.iter().any(|cue| word.contains(cue)) {
            negative += 1;
        }
    }

    if positive + negative == 0 {
        return 0.0;
    }
    (positive as f64 - negative as f64) / (positive as f64 + negative as f64)
}

/// Score the text and attach the label its balance falls into.
pub fn classify(text: &str) -> Sentiment {
    let score = score(text);
    let label = if score > LABEL_THRESHOLD {
        SentimentLabel::Positive
    } else if score < -LABEL_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    Sentiment { label, score }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upbeat_text_is_positive() {
        let s = classify("Markets surge as record profits boost growth across the sector");
        assert_eq!(s.label, SentimentLabel::Positive);
        assert!(s.score > LABEL_THRESHOLD);
    }

    #[test]
    fn grim_text_is_negative() {
        let s = classify("Crisis deepens as losses mount and shares plunge after the breach");
        assert_eq!(s.label, SentimentLabel::Negative);
        assert!(s.score < -LABEL_THRESHOLD);
    }

    #[test]
    fn cue_free_text_is_neutral() {
        let s = classify("The committee met on Tuesday to discuss scheduling.");
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn balanced_text_is_neutral() {
        let s = classify("Early gains were offset by afternoon losses");
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn empty_text_is_neutral() {
        let s = classify("");
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn text_past_the_window_is_ignored() {
        let mut text = "a ".repeat(SENTIMENT_WINDOW / 2);
        text.push_str("crash crisis plunge");
        let s = classify(&text);
        assert_eq!(s.label, SentimentLabel::Neutral);
    }
}

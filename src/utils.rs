//! Utility functions for string truncation, filename sanitization, and
//! file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for log lines and report excerpts
//! - Topic sanitization for report filenames
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to the
/// nearest character boundary) with an ellipsis and byte count indicator
/// appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// The original string if it fits, otherwise a truncated version with
/// `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}

/// Sanitize a topic string into a filename stem.
///
/// Alphanumeric characters are kept, everything else becomes `_`, and the
/// result is capped at 20 characters so report names stay short.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(safe_file_stem("Bitcoin"), "Bitcoin");
/// assert_eq!(safe_file_stem("climate change / EU"), "climate_change___EU");
/// ```
pub fn safe_file_stem(topic: &str) -> String {
    topic
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .take(20)
        .collect()
}

/// Truncate to at most `max_chars` characters, appending `…` when cut.
pub fn excerpt(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // é is two bytes; cutting at 1 must back off, not panic
        let result = truncate_for_log("école", 1);
        assert!(result.starts_with("…") || result.contains("bytes"));
    }

    #[test]
    fn test_safe_file_stem_keeps_alphanumerics() {
        assert_eq!(safe_file_stem("Bitcoin"), "Bitcoin");
        assert_eq!(safe_file_stem("AI news 2026"), "AI_news_2026");
    }

    #[test]
    fn test_safe_file_stem_caps_length() {
        let stem = safe_file_stem("a very long topic about many different things");
        assert_eq!(stem.chars().count(), 20);
    }

    #[test]
    fn test_excerpt_short_passthrough() {
        assert_eq!(excerpt("short", 10), "short");
    }

    #[test]
    fn test_excerpt_cuts_with_ellipsis() {
        let e = excerpt("abcdefghij", 5);
        assert_eq!(e, "abcd…");
        assert_eq!(e.chars().count(), 5);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing() {
        let dir = std::env::temp_dir().join("news_turbo_utils_test");
        let path = dir.to_string_lossy().to_string();
        let _ = stdfs::remove_dir_all(&dir);
        ensure_writable_dir(&path).await.unwrap();
        assert!(dir.is_dir());
        let _ = stdfs::remove_dir_all(&dir);
    }
}

//! On-disk content cache for extracted article bodies.
//!
//! Entries are JSON files named by the SHA-256 of the article key, each
//! holding the extracted body and the time it was cached. A stored entry is
//! served only while younger than the configured TTL; stale entries are
//! treated as misses and overwritten by the next `put`, not deleted.
//! Corrupt or unreadable entries are misses too, never fatal.
//!
//! The cache governs re-fetch avoidance only. Whether an article is fresh
//! enough to appear in results is the freshness filter's job and depends on
//! the article's own published timestamp, not on this TTL.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    cached_at: DateTime<Utc>,
    body: String,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.cached_at > ttl
    }
}

/// Persistent map from article keys to extracted bodies.
///
/// Owned by the orchestrator's construction scope; workers only call
/// [`get`](ContentCache::get) and [`put`](ContentCache::put). Keys within
/// one run are unique (duplicates are removed before extraction), so
/// concurrent workers never write the same file.
#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ContentCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        ContentCache {
            dir: dir.into(),
            ttl,
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Look up a body by article key.
    ///
    /// Returns `None` for absent, stale, or unreadable entries.
    pub async fn get(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(_) => return None,
        };
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "unreadable cache entry, treating as miss");
                return None;
            }
        };
        if entry.is_expired(self.ttl, Utc::now()) {
            debug!(key, "cache entry is stale");
            return None;
        }
        debug!(key, bytes = entry.body.len(), "cache hit");
        Some(entry.body)
    }

    /// Store a body under an article key, overwriting any previous entry.
    ///
    /// Best effort: a failed write is logged and swallowed so extraction
    /// results are never lost to cache trouble.
    pub async fn put(&self, key: &str, body: &str) {
        let entry = CacheEntry {
            cached_at: Utc::now(),
            body: body.to_string(),
        };
        if let Err(e) = self.write_entry(key, &entry).await {
            warn!(key, error = %e, "failed to write cache entry");
        }
    }

    async fn write_entry(&self, key: &str, entry: &CacheEntry) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string(entry).map_err(std::io::Error::other)?;
        fs::write(self.entry_path(key), json).await
    }

    /// Remove every cache entry. Idempotent; returns how many were removed.
    pub async fn clear(&self) -> std::io::Result<usize> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };
        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_at(name: &str, ttl: Duration) -> ContentCache {
        let dir = std::env::temp_dir().join(format!("news_turbo_cache_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        ContentCache::new(dir, ttl)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = cache_at("round_trip", Duration::hours(48));
        cache.put("example.com/a", "extracted body text").await;
        assert_eq!(
            cache.get("example.com/a").await.as_deref(),
            Some("extracted body text")
        );
        assert_eq!(cache.get("example.com/other").await, None);
    }

    #[tokio::test]
    async fn put_overwrites_previous_entry() {
        let cache = cache_at("overwrite", Duration::hours(48));
        cache.put("k", "first").await;
        cache.put("k", "second").await;
        assert_eq!(cache.get("k").await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn stale_entry_is_a_miss_but_file_remains() {
        let cache = cache_at("stale", Duration::hours(48));
        let entry = CacheEntry {
            cached_at: Utc::now() - Duration::hours(49),
            body: "old body".to_string(),
        };
        cache.write_entry("k", &entry).await.unwrap();

        assert_eq!(cache.get("k").await, None);
        assert!(cache.entry_path("k").is_file(), "stale entries stay on disk");

        // the next put takes the slot over
        cache.put("k", "new body").await;
        assert_eq!(cache.get("k").await.as_deref(), Some("new body"));
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let cache = cache_at("corrupt", Duration::hours(48));
        std::fs::create_dir_all(cache.entry_path("k").parent().unwrap()).unwrap();
        std::fs::write(cache.entry_path("k"), "{ not json").unwrap();
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn entries_survive_a_new_handle() {
        let cache = cache_at("restart", Duration::hours(48));
        cache.put("k", "persisted").await;

        let reopened = ContentCache::new(
            std::env::temp_dir().join("news_turbo_cache_restart"),
            Duration::hours(48),
        );
        assert_eq!(reopened.get("k").await.as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn clear_empties_and_is_idempotent() {
        let cache = cache_at("clear", Duration::hours(48));
        cache.put("a", "1").await;
        cache.put("b", "2").await;

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, None);
        assert_eq!(cache.clear().await.unwrap(), 0);

        // clearing a cache whose directory never existed is fine too
        let empty = cache_at("clear_missing", Duration::hours(48));
        assert_eq!(empty.clear().await.unwrap(), 0);
    }
}

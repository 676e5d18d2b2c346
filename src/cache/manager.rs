//! Disk-backed cache
//!
//! Provides a `FileCache` that stores each entry as a JSON file named after
//! the SHA-256 of its key, with an optional expiry timestamp.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

use super::{decode_value, encode_value, Cache, CacheError, CacheValue};

/// Wrapper struct for a cached value stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// The original key, checked on read
    key: String,
    /// Encoded value, see [`encode_value`]
    value: String,
    /// When the value was cached
    cached_at: DateTime<Utc>,
    /// When the entry stops being served, if it expires at all
    expires_at: Option<DateTime<Utc>>,
}

/// Stores cache entries as JSON files
///
/// Entries live in an XDG-compliant cache directory (`~/.cache/stackx/` on
/// Linux). Keys are request URLs, so file names are the hex SHA-256 of the
/// key rather than the key itself.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    /// Lifetime of new entries; `None` keeps them until cleared
    ttl: Option<Duration>,
}

impl FileCache {
    /// Creates a new FileCache using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "stackx")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a new FileCache with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            ttl: None,
        }
    }

    /// Sets how long new entries are served, in hours
    ///
    /// A TTL too large to represent means entries never expire.
    pub fn with_ttl_hours(mut self, ttl_hours: Option<u64>) -> Self {
        self.ttl = ttl_hours
            .and_then(|h| i64::try_from(h).ok())
            .and_then(Duration::try_hours);
        self
    }

    /// Expiry for an entry written at `now`; `None` if it never expires
    fn expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ttl.and_then(|ttl| now.checked_add_signed(ttl))
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    /// Returns the path to the cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.cache_dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Ensures the cache directory exists
    async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir).await
    }
}

#[async_trait]
impl Cache for FileCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        tracing::debug!(key, "reading cache");
        let content = match fs::read_to_string(self.cache_path(key)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: CacheEntry = serde_json::from_str(&content)?;

        if entry.key != key {
            return Ok(None);
        }
        if entry.expires_at.is_some_and(|expires_at| Utc::now() > expires_at) {
            tracing::debug!(key, "cache entry expired");
            return Ok(None);
        }

        Ok(Some(decode_value(entry.value)))
    }

    async fn set(&self, key: &str, value: &CacheValue) -> Result<(), CacheError> {
        tracing::debug!(key, "writing cache");
        self.ensure_dir().await?;

        let now = Utc::now();
        let entry = CacheEntry {
            key: key.to_string(),
            value: encode_value(value),
            cached_at: now,
            expires_at: self.expiry(now),
        };

        let json = serde_json::to_string_pretty(&entry)?;
        fs::write(self.cache_path(key), json).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        tracing::warn!(dir = %self.cache_dir.display(), "clearing cache");
        let mut entries = match fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(path).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::thread;
    use std::time::Duration as StdDuration;
    use tempfile::TempDir;

    const KEY: &str = "https://api.stackexchange.com/2.3/search/advanced?q=DFS+vs+BFS&site=stackoverflow";

    fn create_test_cache() -> (FileCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = FileCache::with_dir(temp_dir.path().to_path_buf());
        (cache, temp_dir)
    }

    #[tokio::test]
    async fn test_set_creates_hashed_file_in_cache_directory() {
        let (cache, temp_dir) = create_test_cache();

        cache.set(KEY, &json!({"question_id": 123})).await.expect("Write should succeed");

        let files: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let name = files[0].as_ref().unwrap().file_name();
        let name = name.to_string_lossy();
        assert_eq!(name.len(), 64 + ".json".len());
        assert!(!name.contains('?'));
    }

    #[tokio::test]
    async fn test_get_returns_none_for_missing_key() {
        let (cache, _temp_dir) = create_test_cache();

        let result = cache.get("nonexistent_key").await.unwrap();

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[tokio::test]
    async fn test_structured_value_roundtrip() {
        let (cache, _temp_dir) = create_test_cache();
        let value = json!([{"question": {"question_id": 123}, "answer": {"answer_id": 50}}]);

        cache.set(KEY, &value).await.unwrap();

        assert_eq!(cache.get(KEY).await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_string_value_passes_through() {
        let (cache, _temp_dir) = create_test_cache();

        cache.set("APPLES", &json!("BANANAS")).await.unwrap();

        assert_eq!(cache.get("APPLES").await.unwrap(), Some(json!("BANANAS")));
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let (cache, _temp_dir) = create_test_cache();
        // Write with 0 hour TTL - should expire immediately
        let cache = cache.with_ttl_hours(Some(0));

        cache.set(KEY, &json!(1)).await.unwrap();
        thread::sleep(StdDuration::from_millis(10));

        assert!(cache.get(KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let (cache, _temp_dir) = create_test_cache();
        let cache = cache.with_ttl_hours(Some(u64::MAX));

        cache.set(KEY, &json!(1)).await.unwrap();

        let content = fs::read_to_string(cache.cache_path(KEY)).unwrap();
        assert!(content.contains("\"expires_at\": null"));
        assert_eq!(cache.get(KEY).await.unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_ttl_overflowing_the_date_range_has_no_expiry() {
        let cache = FileCache::with_dir(PathBuf::from("unused")).with_ttl_hours(Some(100_000_000_000));

        assert!(cache.expiry(Utc::now()).is_none());
    }

    #[tokio::test]
    async fn test_entry_without_ttl_does_not_expire() {
        let (cache, temp_dir) = create_test_cache();

        cache.set(KEY, &json!(1)).await.unwrap();

        let path = cache.cache_path(KEY);
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("\"expires_at\": null"));
        assert!(cache.get(KEY).await.unwrap().is_some());
        drop(temp_dir);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_an_error() {
        let (cache, _temp_dir) = create_test_cache();
        fs::write(cache.cache_path(KEY), "not json").unwrap();

        let result = cache.get(KEY).await;

        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_overwrite_existing_entry() {
        let (cache, _temp_dir) = create_test_cache();

        cache.set(KEY, &json!({"n": 1})).await.unwrap();
        cache.set(KEY, &json!({"n": 2})).await.unwrap();

        assert_eq!(cache.get(KEY).await.unwrap(), Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn test_set_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let cache = FileCache::with_dir(nested_path.clone());

        cache.set("nested_key", &json!(1)).await.expect("Write should succeed");

        assert!(nested_path.exists(), "Nested directory should be created");
    }

    #[tokio::test]
    async fn test_clear_removes_all_entries() {
        let (cache, _temp_dir) = create_test_cache();
        cache.set("a", &json!(1)).await.unwrap();
        cache.set("b", &json!(2)).await.unwrap();

        cache.clear().await.unwrap();

        assert!(cache.get("a").await.unwrap().is_none());
        assert!(cache.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_on_missing_directory_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::with_dir(temp_dir.path().join("never-created"));

        assert!(cache.clear().await.is_ok());
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(cache) = FileCache::new() {
            let path_str = cache.cache_dir().to_string_lossy();
            assert!(path_str.contains("stackx"), "Cache path should contain project name");
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }
}

//! TTL-bounded query cache.
//!
//! Entries are keyed by a short hash of `query|params` and replaced wholesale
//! on every `set`. Stale entries are deleted when read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::XResult;
use crate::twitter::Post;

/// Default freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Hex characters kept from the key digest.
const KEY_LEN: usize = 12;

/// Cache key for a (query, params) pair.
#[must_use]
pub fn cache_key(query: &str, params: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{query}|{params}").as_bytes());
    let mut key = hex::encode(hasher.finalize());
    key.truncate(KEY_LEN);
    key
}

/// A stored result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Query the posts were fetched for.
    pub query: String,
    /// Option disambiguator supplied by the caller.
    pub params: String,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
    /// Cached posts, in fetch order.
    pub payload: Vec<Post>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(query: &str, params: &str, payload: &[Post]) -> Self {
        Self {
            query: query.to_string(),
            params: params.to_string(),
            stored_at: Utc::now(),
            payload: payload.to_vec(),
        }
    }

    /// Whether the entry is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        age_exceeds(self.stored_at, ttl, now)
    }
}

fn age_exceeds(stored_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    let age = now.signed_duration_since(stored_at);
    // Entries stamped in the future are fresh.
    age.to_std().is_ok_and(|age| age > ttl)
}

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Fresh entry.
    Hit(Vec<Post>),
    /// No entry for this key.
    Miss,
    /// Entry was stale and has been removed.
    Expired,
    /// Entry exists but could not be read or decoded; left in place.
    Malformed(String),
}

impl CacheLookup {
    /// Posts on a hit, `None` otherwise.
    #[must_use]
    pub fn into_posts(self) -> Option<Vec<Post>> {
        match self {
            Self::Hit(posts) => Some(posts),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Key/value store with time-to-live reads.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Read posts stored for (query, params) if younger than `ttl`.
    async fn get(&self, query: &str, params: &str, ttl: Duration) -> CacheLookup;

    /// Store posts for (query, params), overwriting any previous entry.
    async fn set(&self, query: &str, params: &str, posts: &[Post]) -> XResult<()>;

    /// Remove entries older than `ttl`, returning how many were removed.
    async fn prune(&self, ttl: Duration) -> XResult<usize>;

    /// Remove every entry, returning how many were removed.
    async fn clear(&self) -> XResult<usize>;
}

/// Directory-backed cache, one JSON file per key.
///
/// No locking is done: two processes racing on the same expired entry may
/// both delete it and both refetch.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the cache directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing (query, params).
    pub fn entry_path(&self, query: &str, params: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(query, params)))
    }

    /// Write a complete entry, replacing whatever was stored under its key.
    pub async fn write_entry(&self, entry: &CacheEntry) -> XResult<()> {
        fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string_pretty(entry)?;
        fs::write(self.entry_path(&entry.query, &entry.params), content).await?;
        Ok(())
    }

    /// List `.json` files in the cache directory.
    async fn entry_files(&self) -> XResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// When a file's entry was stored, by its timestamp or else its mtime.
    async fn stored_at(path: &Path) -> Option<DateTime<Utc>> {
        if let Ok(content) = fs::read_to_string(path).await {
            if let Ok(entry) = serde_json::from_str::<CacheEntry>(&content) {
                return Some(entry.stored_at);
            }
        }
        let modified: SystemTime = fs::metadata(path).await.ok()?.modified().ok()?;
        Some(modified.into())
    }
}

#[async_trait]
impl Cache for FileCache {
    async fn get(&self, query: &str, params: &str, ttl: Duration) -> CacheLookup {
        let path = self.entry_path(query, params);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheLookup::Miss,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cache entry unreadable");
                return CacheLookup::Malformed(e.to_string());
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cache entry malformed");
                return CacheLookup::Malformed(e.to_string());
            }
        };

        if entry.is_expired(ttl, Utc::now()) {
            tracing::debug!(query, params, "Cache entry expired");
            if let Err(e) = fs::remove_file(&path).await {
                tracing::debug!(path = %path.display(), error = %e, "Expired entry already gone");
            }
            return CacheLookup::Expired;
        }

        tracing::debug!(query, params, count = entry.payload.len(), "Cache hit");
        CacheLookup::Hit(entry.payload)
    }

    async fn set(&self, query: &str, params: &str, posts: &[Post]) -> XResult<()> {
        self.write_entry(&CacheEntry::new(query, params, posts)).await
    }

    async fn prune(&self, ttl: Duration) -> XResult<usize> {
        let now = Utc::now();
        let mut removed = 0;

        for path in self.entry_files().await? {
            let Some(stored_at) = Self::stored_at(&path).await else {
                continue;
            };
            if age_exceeds(stored_at, ttl, now) && fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }

        tracing::debug!(removed, "Pruned cache");
        Ok(removed)
    }

    async fn clear(&self) -> XResult<usize> {
        let mut removed = 0;
        for path in self.entry_files().await? {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Failed to remove cache file");
                }
            }
        }

        tracing::debug!(removed, "Cleared cache");
        Ok(removed)
    }
}

/// In-process cache with the same semantics as [`FileCache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a complete entry, replacing whatever was stored under its key.
    pub async fn insert_entry(&self, entry: CacheEntry) {
        let key = cache_key(&entry.query, &entry.params);
        self.entries.write().await.insert(key, entry);
    }

    /// Number of stored entries, fresh or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, query: &str, params: &str, ttl: Duration) -> CacheLookup {
        let key = cache_key(query, params);
        let mut entries = self.entries.write().await;

        match entries.get(&key) {
            None => return CacheLookup::Miss,
            Some(entry) if !entry.is_expired(ttl, Utc::now()) => {
                return CacheLookup::Hit(entry.payload.clone());
            }
            Some(_) => {}
        }

        entries.remove(&key);
        CacheLookup::Expired
    }

    async fn set(&self, query: &str, params: &str, posts: &[Post]) -> XResult<()> {
        self.insert_entry(CacheEntry::new(query, params, posts)).await;
        Ok(())
    }

    async fn prune(&self, ttl: Duration) -> XResult<usize> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(ttl, now));
        Ok(before - entries.len())
    }

    async fn clear(&self) -> XResult<usize> {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}

//! Selector cache persistence
//!
//! The cache maps a page URL to the selectors resolved for descriptions on
//! that page. Stores only offer whole-document `load` and `save`; callers
//! reload, mutate and rewrite. Two resolutions writing the same store at the
//! same time can lose one of the updates.

use crate::error::{LocatorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Page URL -> (description -> selector)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorCache {
    pages: BTreeMap<String, BTreeMap<String, String>>,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached selector for a description on a page
    pub fn get(&self, url: &str, description: &str) -> Option<&str> {
        self.pages
            .get(url)
            .and_then(|entries| entries.get(description))
            .map(String::as_str)
    }

    /// Store a selector, replacing any previous one for the same pair
    pub fn insert(
        &mut self,
        url: impl Into<String>,
        description: impl Into<String>,
        selector: impl Into<String>,
    ) {
        self.pages
            .entry(url.into())
            .or_default()
            .insert(description.into(), selector.into());
    }

    /// All descriptions cached for a page
    pub fn page(&self, url: &str) -> Option<&BTreeMap<String, String>> {
        self.pages.get(url)
    }

    /// Total number of cached selectors across all pages
    pub fn len(&self) -> usize {
        self.pages.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Durable storage for a [`SelectorCache`]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the stored cache. Absent or unreadable storage yields an empty cache.
    async fn load(&self) -> SelectorCache;

    /// Replace the stored cache with `cache`
    async fn save(&self, cache: &SelectorCache) -> Result<()>;
}

// Distinguishes concurrent saves within one process
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// JSON file store
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a reader sees either the old or the new document.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "selector-cache.json".to_string());
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.path.with_file_name(format!(
            ".{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            seq
        ))
    }
}

impl Default for FileCacheStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CACHE_PATH)
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn load(&self) -> SelectorCache {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("No selector cache at {}: {}", self.path.display(), e);
                return SelectorCache::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(cache) => cache,
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable selector cache {}: {}",
                    self.path.display(),
                    e
                );
                SelectorCache::new()
            }
        }
    }

    async fn save(&self, cache: &SelectorCache) -> Result<()> {
        let json = serde_json::to_string_pretty(cache)
            .map_err(|e| LocatorError::Cache(format!("Failed to serialize cache: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LocatorError::Cache(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await.map_err(|e| {
            LocatorError::Cache(format!("Failed to write {}: {}", temp.display(), e))
        })?;

        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(LocatorError::Cache(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            )));
        }

        Ok(())
    }
}

/// In-process store, nothing touches disk
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    cache: Mutex<SelectorCache>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: SelectorCache) -> Self {
        Self {
            cache: Mutex::new(cache),
        }
    }

    /// Copy of the current contents
    pub async fn snapshot(&self) -> SelectorCache {
        self.cache.lock().await.clone()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load(&self) -> SelectorCache {
        self.cache.lock().await.clone()
    }

    async fn save(&self, cache: &SelectorCache) -> Result<()> {
        *self.cache.lock().await = cache.clone();
        Ok(())
    }
}

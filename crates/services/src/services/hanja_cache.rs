//! Two-tier cache: a bounded in-process map in front of an optional
//! persistent tier. Expiry is checked lazily on read against an injected
//! clock.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use strum_macros::{Display, EnumString};
use tracing::{debug, warn};

use super::clock::Clock;

pub const MEMORY_LIMIT: usize = 200;
pub const PERSISTENT_PREFIX: &str = "hanjaro_cache_";

const HOUR_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CacheCategory {
    Character,
    Grade,
    Category,
}

impl CacheCategory {
    pub fn ttl_ms(self) -> i64 {
        match self {
            CacheCategory::Character => 24 * HOUR_MS,
            CacheCategory::Grade => 12 * HOUR_MS,
            CacheCategory::Category => 6 * HOUR_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    /// Epoch milliseconds at insertion.
    pub timestamp: i64,
    /// Lifetime in milliseconds.
    pub expiry: i64,
}

impl CacheEntry {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.timestamp + self.expiry
    }
}

/// Storage behind the memory tier. Implementations swallow their own
/// failures; a failed read is a miss and a failed write is a no-op.
#[async_trait]
pub trait PersistentTier: Send + Sync {
    async fn get(&self, key: &str) -> Option<CacheEntry>;
    async fn set(&self, key: &str, entry: &CacheEntry);
    async fn remove(&self, key: &str);
    async fn clear(&self);
    async fn version(&self) -> Option<String>;
    async fn set_version(&self, version: &str);
}

/// Persistent tier for processes that have nowhere to persist to.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

#[async_trait]
impl PersistentTier for NoPersistence {
    async fn get(&self, _key: &str) -> Option<CacheEntry> {
        None
    }
    async fn set(&self, _key: &str, _entry: &CacheEntry) {}
    async fn remove(&self, _key: &str) {}
    async fn clear(&self) {}
    async fn version(&self) -> Option<String> {
        None
    }
    async fn set_version(&self, _version: &str) {}
}

/// One JSON file per key, named `hanjaro_cache_<key>.json`, in a directory.
#[derive(Debug, Clone)]
pub struct FileTier {
    dir: PathBuf,
}

impl FileTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{PERSISTENT_PREFIX}{}.json", urlencoding::encode(key)))
    }

    fn version_path(&self) -> PathBuf {
        self.dir.join(format!("{PERSISTENT_PREFIX}version"))
    }

    async fn write(&self, path: PathBuf, bytes: Vec<u8>) {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "cannot create cache directory");
            return;
        }
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            warn!(path = %path.display(), error = %e, "cache write failed");
        }
    }

    async fn delete(&self, path: PathBuf) {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "cache delete failed"),
        }
    }
}

#[async_trait]
impl PersistentTier for FileTier {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key = key, error = %e, "cache read failed");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = key, error = %e, "corrupt cache entry");
                None
            }
        }
    }

    async fn set(&self, key: &str, entry: &CacheEntry) {
        match serde_json::to_vec(entry) {
            Ok(bytes) => self.write(self.entry_path(key), bytes).await,
            Err(e) => warn!(key = key, error = %e, "cache entry not serializable"),
        }
    }

    async fn remove(&self, key: &str) {
        self.delete(self.entry_path(key)).await;
    }

    async fn clear(&self) {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot list cache directory");
                return;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let owned = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(PERSISTENT_PREFIX));
            if owned {
                self.delete(entry.path()).await;
            }
        }
    }

    async fn version(&self) -> Option<String> {
        tokio::fs::read_to_string(self.version_path()).await.ok()
    }

    async fn set_version(&self, version: &str) {
        self.write(self.version_path(), version.as_bytes().to_vec())
            .await;
    }
}

/// Memory first, then the persistent tier. A persistent hit is copied into
/// memory with the character TTL regardless of how it was first stored.
pub struct TwoTierCache {
    memory: Mutex<HashMap<String, CacheEntry>>,
    persistent: Arc<dyn PersistentTier>,
    clock: Arc<dyn Clock>,
}

impl TwoTierCache {
    pub fn new(persistent: Arc<dyn PersistentTier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            persistent,
            clock,
        }
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.memory.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn memory_get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();
        let mut memory = self.memory();
        if memory.get(key)?.is_expired(now) {
            memory.remove(key);
            return None;
        }
        memory.get(key).map(|entry| entry.data.clone())
    }

    fn memory_set(&self, key: &str, entry: CacheEntry) {
        let mut memory = self.memory();
        if !memory.contains_key(key) && memory.len() >= MEMORY_LIMIT {
            let oldest = memory
                .iter()
                .min_by_key(|(_, e)| e.timestamp)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!(key = %oldest, "evicting oldest cache entry");
                memory.remove(&oldest);
            }
        }
        memory.insert(key.to_string(), entry);
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        if let Some(data) = self.memory_get(key) {
            return Some(data);
        }

        let entry = self.persistent.get(key).await?;
        let now = self.clock.now_ms();
        if entry.is_expired(now) {
            self.persistent.remove(key).await;
            return None;
        }
        self.memory_set(
            key,
            CacheEntry {
                data: entry.data.clone(),
                timestamp: now,
                expiry: CacheCategory::Character.ttl_ms(),
            },
        );
        Some(entry.data)
    }

    pub async fn set(&self, key: &str, data: Value, category: CacheCategory) {
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now_ms(),
            expiry: category.ttl_ms(),
        };
        self.persistent.set(key, &entry).await;
        self.memory_set(key, entry);
    }

    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.get(key).await?;
        match serde_json::from_value(data) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = key, error = %e, "cached value has an unexpected shape");
                None
            }
        }
    }

    pub async fn set_as<T: Serialize>(&self, key: &str, value: &T, category: CacheCategory) {
        match serde_json::to_value(value) {
            Ok(data) => self.set(key, data, category).await,
            Err(e) => warn!(key = key, error = %e, "value not cacheable"),
        }
    }

    pub async fn remove(&self, key: &str) {
        self.memory().remove(key);
        self.persistent.remove(key).await;
    }

    pub async fn clear(&self) {
        self.memory().clear();
        self.persistent.clear().await;
    }

    /// Drops every cached entry when the stored cache version differs from
    /// `version`, then records `version`.
    pub async fn initialize(&self, version: &str) {
        if self.persistent.version().await.as_deref() == Some(version) {
            return;
        }
        debug!(version = version, "cache version changed, clearing");
        self.clear().await;
        self.persistent.set_version(version).await;
    }

    pub fn memory_len(&self) -> usize {
        self.memory().len()
    }
}

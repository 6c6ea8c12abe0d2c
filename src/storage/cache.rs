//! Key-value cache store.
//!
//! The offline core treats local persistence as a cache, not as the source of
//! truth: a failed read is logged and degrades to "absent". Callers that must
//! not mistake an unreadable value for a missing one (the action log) use
//! [`CacheStore::try_get`] instead.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::LocalStorage;
use crate::repositories::CacheEntryRepository;

/// Scoped key-value storage used for cached snapshots and the action log.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key`, `Ok(None)` when absent and an
    /// error when the value exists but cannot be read.
    async fn try_get(&self, key: &str) -> Result<Option<Value>>;

    /// Returns the value stored under `key`, or `None` when absent or unreadable.
    async fn get(&self, key: &str) -> Option<Value> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("⚠️  Treating cache key '{key}' as absent: {e:#}");
                None
            }
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value);

    /// Removes every key in `keys`; missing keys are ignored.
    async fn remove(&self, keys: &[&str]);
}

/// Cache store persisted in the local SQLite database.
#[derive(Clone)]
pub struct SqliteCacheStore {
    storage: Arc<Mutex<LocalStorage>>,
}

impl SqliteCacheStore {
    pub fn new(storage: Arc<Mutex<LocalStorage>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn try_get(&self, key: &str) -> Result<Option<Value>> {
        let storage = self.storage.lock().await;
        let Some(entry) = CacheEntryRepository::get(storage.connection(), key)
            .await
            .with_context(|| format!("Failed to read cache key '{key}'"))?
        else {
            return Ok(None);
        };

        let value = serde_json::from_str(&entry.value)
            .with_context(|| format!("Unreadable cache value for '{key}'"))?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) {
        let encoded = match serde_json::to_string(&value) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("❌ Failed to encode cache value for '{key}': {e}");
                return;
            }
        };

        let storage = self.storage.lock().await;
        let updated_at = Utc::now().to_rfc3339();
        if let Err(e) = CacheEntryRepository::upsert(storage.connection(), key, encoded, updated_at).await {
            error!("❌ Failed to write cache key '{key}': {e}");
        }
    }

    async fn remove(&self, keys: &[&str]) {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let storage = self.storage.lock().await;
        if let Err(e) = CacheEntryRepository::delete_many(storage.connection(), &keys).await {
            error!("❌ Failed to remove cache keys {keys:?}: {e}");
        }
    }
}

/// Cache store kept entirely in memory.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn try_get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) {
        self.entries.lock().await.insert(key.to_string(), value);
    }

    async fn remove(&self, keys: &[&str]) {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(*key);
        }
    }
}

/// Reads `key` and decodes it into `T`.
///
/// A value that does not decode is treated as absent.
pub async fn read_json<T: DeserializeOwned>(store: &dyn CacheStore, key: &str) -> Option<T> {
    let value = store.get(key).await?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!("⚠️  Cached value for '{key}' has an unexpected shape: {e}");
            None
        }
    }
}

/// Encodes `value` and stores it under `key`.
pub async fn write_json<T: Serialize + ?Sized + Sync>(store: &dyn CacheStore, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(encoded) => store.set(key, encoded).await,
        Err(e) => error!("❌ Failed to encode value for '{key}': {e}"),
    }
}

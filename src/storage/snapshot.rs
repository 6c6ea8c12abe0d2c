//! Cached entity sets: last-known snapshots of server-owned records.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

use super::cache::{read_json, write_json, CacheStore};
use crate::backend::{Organization, Task};

/// A server record that can be kept in a cached snapshot.
pub trait CachedEntity: Serialize + DeserializeOwned + Send + Sync {
    /// Stable identifier; each id appears at most once in a snapshot.
    fn cache_id(&self) -> i64;
}

impl CachedEntity for Task {
    fn cache_id(&self) -> i64 {
        self.id
    }
}

impl CachedEntity for Organization {
    fn cache_id(&self) -> i64 {
        self.id
    }
}

/// Collapses duplicate ids, keeping the position of the first occurrence and
/// the contents of the last one.
pub fn dedup_by_id<T: CachedEntity>(records: Vec<T>) -> Vec<T> {
    let mut positions: HashMap<i64, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<T> = Vec::with_capacity(records.len());

    for record in records {
        match positions.get(&record.cache_id()) {
            Some(&index) => unique[index] = record,
            None => {
                positions.insert(record.cache_id(), unique.len());
                unique.push(record);
            }
        }
    }

    unique
}

/// Replaces the snapshot stored under `key`.
pub async fn write_snapshot<T: CachedEntity>(store: &dyn CacheStore, key: &str, records: Vec<T>) {
    let records = dedup_by_id(records);
    write_json(store, key, &records).await;
}

/// Reads the snapshot stored under `key`; absent or unreadable is empty.
pub async fn read_snapshot<T: CachedEntity>(store: &dyn CacheStore, key: &str) -> Vec<T> {
    read_json::<Vec<T>>(store, key).await.unwrap_or_default()
}

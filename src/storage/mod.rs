//! Local storage module for offline persistence
//!
//! This module provides:
//! - [`LocalStorage`], the SeaORM/SQLite database handle
//! - [`CacheStore`], the key-value interface the offline core is written against
//! - A SQLite-backed and an in-memory cache store implementation
//! - Snapshot helpers for cached entity sets

pub mod cache;
pub mod db;
pub mod snapshot;

pub use cache::{read_json, write_json, CacheStore, MemoryCacheStore, SqliteCacheStore};
pub use db::LocalStorage;
pub use snapshot::{read_snapshot, write_snapshot, CachedEntity};

//! Taskline - offline-first core of a task-management client
//!
//! This library lets a client keep working against locally cached data while
//! disconnected. Every mutation made offline is recorded as a durable intent
//! and replayed against the remote task service once connectivity returns.
//!
//! # Modules
//!
//! * [`connectivity`] - Network state monitor and reachability probing
//! * [`storage`] - Durable key-value cache store on SQLite
//! * [`queue`] - Ordered log of offline actions
//! * [`sync`] - Engine that replays queued actions
//! * [`offline`] - Offline-aware data access façade
//! * [`backend`] - Remote task service contract and HTTP client

/// Service wiring from configuration
pub mod app;

/// Remote backend abstraction and HTTP implementation
pub mod backend;

/// Configuration module for managing application settings
pub mod config;

/// Connectivity monitoring and reachability probing
pub mod connectivity;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for database tables
pub mod entities;

/// Logging utilities for debugging and error tracking
pub mod logger;

/// Offline-aware reads and writes for UI-facing code
pub mod offline;

/// Durable offline action queue
pub mod queue;

/// Repository layer for database operations
pub mod repositories;

/// Local storage layer for the cache store
pub mod storage;

/// Sync engine draining the action queue
pub mod sync;

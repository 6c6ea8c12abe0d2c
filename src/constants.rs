//! Constants used throughout the application
//!
//! This module centralizes cache keys, default values and user-facing text
//! so the storage layout and messages stay consistent.

// Cache store keys
pub const CACHE_KEY_TASKS: &str = "offline_tasks";
pub const CACHE_KEY_ORGANIZATIONS: &str = "offline_organizations";
pub const CACHE_KEY_PENDING_ACTIONS: &str = "offline_pending_actions";
pub const CACHE_KEY_LAST_SYNC: &str = "offline_last_sync";

// Configuration defaults
pub const APP_NAME: &str = "taskline";
pub const CONFIG_FILE_NAME: &str = "taskline.toml";
pub const DEFAULT_API_BASE_URL: &str = "https://api.taskline.app/v1";
pub const DEFAULT_API_TOKEN_ENV: &str = "TASKLINE_API_TOKEN";
pub const DEFAULT_API_TIMEOUT_SECONDS: u64 = 30;
pub const MAX_API_TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_DATABASE_FILE: &str = "cache.db";
pub const DEFAULT_PROBE_ADDRESS: &str = "1.1.1.1:443";
pub const DEFAULT_PROBE_INTERVAL_SECONDS: u64 = 30;
pub const MAX_PROBE_INTERVAL_SECONDS: u64 = 3600;
pub const PROBE_CONNECT_TIMEOUT_SECONDS: u64 = 3;
pub const LOG_FILE_NAME: &str = "taskline.log";
pub const MAX_IN_MEMORY_LOG_LINES: usize = 500;

// Status messages
pub const STATUS_ONLINE: &str = "🌐 Online";
pub const STATUS_OFFLINE: &str = "📴 Offline";
pub const STATUS_USING_CACHED_DATA: &str = "⚠️  Using cached data";
pub const STATUS_QUEUED_OFFLINE: &str = "📥 Saved offline, will sync when back online";
pub const STATUS_NEVER_SYNCED: &str = "never";

// Sync messages
pub const SYNC_SKIPPED_OFFLINE: &str = "⏸️  Sync skipped: device is offline";
pub const SYNC_ALREADY_RUNNING: &str = "⏳ Sync already in progress";

pub const CONFIG_GENERATED: &str = "✅ Default configuration written to";

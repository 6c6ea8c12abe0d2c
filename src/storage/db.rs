use anyhow::{Context, Result};
use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use std::time::Duration;

use crate::config::StorageConfig;
use crate::entities::CacheEntry;

/// Local storage manager backed by SQLite
pub struct LocalStorage {
    conn: DatabaseConnection,
}

impl LocalStorage {
    /// Initialize local storage from the `[storage]` section.
    ///
    /// With `in_memory` set the database lives only as long as this handle,
    /// otherwise the configured (or default) database file is used.
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        if config.in_memory {
            Self::connect("sqlite::memory:".to_string()).await
        } else {
            Self::open(&config.resolve_database_path()?).await
        }
    }

    /// Open (or create) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create storage directory: {}", parent.display()))?;
            }
        }

        Self::connect(format!("sqlite://{}?mode=rwc", path.display())).await
    }

    async fn connect(database_url: String) -> Result<Self> {
        let mut options = ConnectOptions::new(database_url.clone());
        // A single long-lived connection: an in-memory database disappears with
        // its last connection, and the action log is written by one task at a time.
        options
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(Duration::from_secs(u32::MAX as u64))
            .max_lifetime(Duration::from_secs(u32::MAX as u64))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .with_context(|| format!("Failed to open database: {database_url}"))?;

        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        info!("💾 Local storage ready ({database_url})");

        Ok(storage)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        let mut create_cache_entries = schema.create_table_from_entity(CacheEntry);
        create_cache_entries.if_not_exists();

        self.conn
            .execute(backend.build(&create_cache_entries))
            .await
            .context("Failed to create cache_entries table")?;

        Ok(())
    }

    /// Access the underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}

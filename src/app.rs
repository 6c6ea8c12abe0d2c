//! Service wiring.
//!
//! [`App`] constructs the offline core once per process from configuration:
//! cache store, action queue, connectivity monitor, sync engine and the data
//! access façade, all shared through `Arc`s instead of globals.

use anyhow::{Context, Result};
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::backend::{factory, Backend};
use crate::config::Config;
use crate::connectivity::probe::{self, ReachabilityProbe, TcpProbe};
use crate::connectivity::ConnectivityMonitor;
use crate::constants::PROBE_CONNECT_TIMEOUT_SECONDS;
use crate::offline::OfflineDataAccess;
use crate::queue::ActionQueue;
use crate::storage::{CacheStore, LocalStorage, SqliteCacheStore};
use crate::sync::SyncEngine;

/// The constructed service graph.
pub struct App {
    pub config: Config,
    pub store: Arc<dyn CacheStore>,
    pub queue: ActionQueue,
    pub monitor: Arc<ConnectivityMonitor>,
    pub engine: Arc<SyncEngine>,
    pub data: OfflineDataAccess,
}

impl App {
    /// Build the services with the backend described by `config.api`.
    pub async fn build(config: Config) -> Result<Self> {
        let backend = factory::create_backend(&config.api.backend_type, &config.api)?;
        Self::with_backend(config, backend).await
    }

    /// Build the services around an existing backend.
    pub async fn with_backend(config: Config, backend: Arc<dyn Backend>) -> Result<Self> {
        let store = Self::open_store(&config).await?;
        let queue = ActionQueue::new(store.clone());
        let monitor = Arc::new(ConnectivityMonitor::new());

        let engine = Arc::new(
            SyncEngine::new(backend.clone(), queue.clone(), store.clone(), monitor.clone())
                .with_refresh_after_drain(config.sync.refresh_after_drain),
        );

        if config.sync.sync_on_reconnect {
            monitor.attach_reconnect_handler(&engine);
        }

        let data = OfflineDataAccess::new(backend, store.clone(), queue.clone(), monitor.clone(), engine.clone());

        Ok(Self {
            config,
            store,
            queue,
            monitor,
            engine,
            data,
        })
    }

    async fn open_store(config: &Config) -> Result<Arc<dyn CacheStore>> {
        if config.storage.in_memory {
            info!("💾 Cache kept in memory, nothing survives a restart");
        }

        let storage = LocalStorage::from_config(&config.storage).await?;
        Ok(Arc::new(SqliteCacheStore::new(Arc::new(Mutex::new(storage)))))
    }

    fn tcp_probe(&self) -> Result<TcpProbe> {
        let address: SocketAddr = self
            .config
            .sync
            .probe_address
            .parse()
            .with_context(|| format!("Invalid probe address '{}'", self.config.sync.probe_address))?;
        Ok(TcpProbe::new(address, Duration::from_secs(PROBE_CONNECT_TIMEOUT_SECONDS)))
    }

    /// Probe reachability once and update the monitor.
    pub async fn check_connectivity(&self) -> Result<bool> {
        let online = self.tcp_probe()?.is_reachable().await;
        if let Some(drain) = self.monitor.set_online(online) {
            if let Err(e) = drain.await {
                warn!("⚠️  Reconnect sync did not finish: {e}");
            }
        }
        Ok(online)
    }

    /// Start background reachability polling, unless disabled in config.
    pub fn start_probe(&self) -> Result<Option<JoinHandle<()>>> {
        let interval = self.config.sync.probe_interval_seconds;
        if interval == 0 {
            return Ok(None);
        }

        let handle = probe::spawn_polling(self.monitor.clone(), self.tcp_probe()?, Duration::from_secs(interval));
        Ok(Some(handle))
    }
}

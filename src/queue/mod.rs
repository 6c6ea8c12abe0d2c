//! Durable action queue.
//!
//! The [`ActionQueue`] owns the lifecycle of offline actions: it appends new
//! intents to the persisted log, lists the ones still pending, flags the ones
//! that were replayed and finally compacts them away. Every operation reads,
//! modifies and writes the whole log under one async lock, which is plenty for
//! a log of a few hundred entries and rules out lost updates between
//! concurrent enqueue and mark-synced calls.
//!
//! The log is decoded element by element. An element this client cannot read
//! is reported as [`PendingAction::Undecodable`] and written back untouched;
//! a log that cannot be read at all is never rewritten.

pub mod action;

pub use action::{ActionPayload, ActionRecord, ActionType, OfflineAction, PendingAction};

use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use self::action::LogEntry;
use crate::constants::CACHE_KEY_PENDING_ACTIONS;
use crate::storage::CacheStore;

/// Errors raised by queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Failed to encode action payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Action log could not be read, leaving it untouched: {0}")]
    Unreadable(String),

    #[error("Action log is not a list, leaving it untouched")]
    Corrupt,
}

/// Ordered, append-only log of offline actions layered on a cache store.
#[derive(Clone)]
pub struct ActionQueue {
    store: Arc<dyn CacheStore>,
    lock: Arc<Mutex<()>>,
}

impl ActionQueue {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn load(&self) -> Result<Vec<LogEntry>, QueueError> {
        let stored = self
            .store
            .try_get(CACHE_KEY_PENDING_ACTIONS)
            .await
            .map_err(|e| QueueError::Unreadable(format!("{e:#}")))?;

        match stored {
            None => Ok(Vec::new()),
            Some(Value::Array(elements)) => Ok(elements.into_iter().map(LogEntry::from_value).collect()),
            Some(_) => Err(QueueError::Corrupt),
        }
    }

    async fn save(&self, entries: &[LogEntry]) -> Result<(), QueueError> {
        let elements = entries
            .iter()
            .map(LogEntry::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.store
            .set(CACHE_KEY_PENDING_ACTIONS, Value::Array(elements))
            .await;
        Ok(())
    }

    /// Records a new action and appends it to the log.
    ///
    /// Queuing never depends on connectivity, so callers can take the same
    /// code path online and offline.
    ///
    /// # Errors
    /// Returns [`QueueError::Encode`] if the payload cannot be serialized, or
    /// [`QueueError::Unreadable`]/[`QueueError::Corrupt`] if the existing log
    /// cannot be read, in which case nothing is written.
    pub async fn enqueue(&self, payload: ActionPayload) -> Result<OfflineAction, QueueError> {
        let action = OfflineAction {
            id: Uuid::now_v7().to_string(),
            payload,
            timestamp: Utc::now(),
            synced: false,
        };
        let record = ActionRecord::from_action(&action)?;

        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.push(LogEntry::Record(record));
        self.save(&entries).await?;

        info!("📥 Queued {} action {} ({} in log)", action.action_type(), action.id, entries.len());
        Ok(action)
    }

    /// Returns every unsynced action in creation order.
    ///
    /// An unreadable log is logged and listed as empty.
    pub async fn list_pending(&self) -> Vec<PendingAction> {
        let _guard = self.lock.lock().await;
        match self.load().await {
            Ok(entries) => entries
                .iter()
                .filter(|entry| entry.is_pending())
                .map(LogEntry::decode)
                .collect(),
            Err(e) => {
                error!("❌ {e}");
                Vec::new()
            }
        }
    }

    /// Number of unsynced actions in the log.
    pub async fn pending_count(&self) -> usize {
        let _guard = self.lock.lock().await;
        match self.load().await {
            Ok(entries) => entries.iter().filter(|entry| entry.is_pending()).count(),
            Err(e) => {
                error!("❌ {e}");
                0
            }
        }
    }

    /// Flags the action as replayed. Unknown ids are ignored.
    pub async fn mark_synced(&self, id: &str) -> Result<(), QueueError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;

        let record = entries.iter_mut().find_map(|entry| match entry {
            LogEntry::Record(record) if record.id == id => Some(record),
            _ => None,
        });

        match record {
            Some(record) if !record.synced => {
                record.synced = true;
                self.save(&entries).await?;
                debug!("Marked action {id} as synced");
            }
            Some(_) => debug!("Action {id} already synced"),
            None => debug!("Action {id} not in log, nothing to mark"),
        }
        Ok(())
    }

    /// Drops every synced action from the log and returns how many were removed.
    pub async fn compact(&self) -> Result<usize, QueueError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;

        let before = entries.len();
        entries.retain(LogEntry::is_pending);
        let removed = before - entries.len();

        if removed > 0 {
            self.save(&entries).await?;
            debug!("Compacted {removed} synced action(s), {} left", entries.len());
        }
        Ok(removed)
    }

    /// Removes the entire log, pending actions included, and returns how many
    /// readable entries it held.
    ///
    /// Meant for manual cleanup of entries this client cannot replay, including
    /// a log that cannot be read at all.
    pub async fn clear(&self) -> usize {
        let _guard = self.lock.lock().await;
        let dropped = self.load().await.map(|entries| entries.len()).unwrap_or(0);
        self.store.remove(&[CACHE_KEY_PENDING_ACTIONS]).await;
        if dropped > 0 {
            warn!("🗑️  Cleared {dropped} action(s) from the offline log");
        }
        dropped
    }
}

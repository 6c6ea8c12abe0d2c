//! Synchronization engine for replaying offline actions.
//!
//! This module provides the [`SyncEngine`] which drains the [`ActionQueue`]
//! against the remote backend once the device is online. A drain walks the
//! pending actions in creation order and isolates failures per action: a
//! rejected or malformed action stays queued while the rest of the batch
//! carries on.
//!
//! A drain is started either by the [`ConnectivityMonitor`] on reconnect or by
//! an explicit user-triggered sync. Only one drain runs at a time.

mod dispatch;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::backend::{Backend, TaskFilter};
use crate::connectivity::{ConnectivityMonitor, ReconnectHandler};
use crate::constants::{CACHE_KEY_LAST_SYNC, CACHE_KEY_TASKS, SYNC_ALREADY_RUNNING, SYNC_SKIPPED_OFFLINE};
use crate::queue::{ActionQueue, PendingAction};
use crate::storage::{read_json, write_json, write_snapshot, CacheStore};

/// Result of one drain request.
#[derive(Debug, Clone)]
pub enum DrainOutcome {
    /// The device was offline; nothing was attempted.
    Offline,
    /// Another drain was already in flight.
    AlreadyRunning,
    /// The pending actions were walked.
    Completed(DrainReport),
}

/// What happened to a single action during a drain.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionStatus {
    Synced,
    Failed(String),
    Skipped(String),
}

/// Per-action entry of a [`DrainReport`].
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub id: String,
    pub action_type: String,
    pub status: ActionStatus,
}

/// Summary of a completed drain.
#[derive(Debug, Clone)]
pub struct DrainReport {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Synced actions removed from the log at the end of the pass
    pub compacted: usize,
    pub results: Vec<ActionResult>,
    pub finished_at: DateTime<Utc>,
}

impl DrainReport {
    fn new() -> Self {
        Self {
            succeeded: 0,
            failed: 0,
            skipped: 0,
            compacted: 0,
            results: Vec::new(),
            finished_at: Utc::now(),
        }
    }

    fn add(&mut self, result: ActionResult) {
        match &result.status {
            ActionStatus::Synced => self.succeeded += 1,
            ActionStatus::Failed(_) => self.failed += 1,
            ActionStatus::Skipped(_) => self.skipped += 1,
        }
        self.results.push(result);
    }

    /// Total actions looked at.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

/// Replays queued actions against the remote backend.
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use taskline::backend::Backend;
/// use taskline::connectivity::ConnectivityMonitor;
/// use taskline::queue::ActionQueue;
/// use taskline::storage::{CacheStore, MemoryCacheStore};
/// use taskline::sync::SyncEngine;
///
/// # async fn example(backend: Arc<dyn Backend>) {
/// let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
/// let monitor = Arc::new(ConnectivityMonitor::new());
/// let queue = ActionQueue::new(store.clone());
/// let engine = Arc::new(SyncEngine::new(backend, queue, store, monitor.clone()));
///
/// // Drain automatically whenever the device comes back online
/// monitor.attach_reconnect_handler(&engine);
///
/// // Or drain on demand
/// engine.drain().await;
/// # }
/// ```
pub struct SyncEngine {
    backend: Arc<dyn Backend>,
    queue: ActionQueue,
    store: Arc<dyn CacheStore>,
    monitor: Arc<ConnectivityMonitor>,
    drain_in_progress: AtomicBool,
    refresh_after_drain: bool,
}

/// Clears the in-flight flag when the drain ends, including when the drain
/// future is dropped before completing.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncEngine {
    pub fn new(
        backend: Arc<dyn Backend>,
        queue: ActionQueue,
        store: Arc<dyn CacheStore>,
        monitor: Arc<ConnectivityMonitor>,
    ) -> Self {
        Self {
            backend,
            queue,
            store,
            monitor,
            drain_in_progress: AtomicBool::new(false),
            refresh_after_drain: false,
        }
    }

    /// Re-fetch the cached task list after a drain that replayed something.
    pub fn with_refresh_after_drain(mut self, refresh: bool) -> Self {
        self.refresh_after_drain = refresh;
        self
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    /// Checks if a drain is currently running.
    pub fn is_draining(&self) -> bool {
        self.drain_in_progress.load(Ordering::SeqCst)
    }

    fn begin_drain(&self) -> Option<DrainGuard<'_>> {
        self.drain_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| DrainGuard(&self.drain_in_progress))
    }

    /// Time of the last completed drain, if any.
    pub async fn last_sync(&self) -> Option<DateTime<Utc>> {
        read_json(self.store.as_ref(), CACHE_KEY_LAST_SYNC).await
    }

    /// Replays every pending action once.
    ///
    /// Returns without doing anything when offline or when another drain is
    /// in flight. Remote failures never surface here; they leave the action
    /// pending for the next pass and show up in the [`DrainReport`].
    pub async fn drain(&self) -> DrainOutcome {
        if !self.monitor.is_online() {
            info!("{SYNC_SKIPPED_OFFLINE}");
            return DrainOutcome::Offline;
        }

        let Some(_guard) = self.begin_drain() else {
            info!("{SYNC_ALREADY_RUNNING}");
            return DrainOutcome::AlreadyRunning;
        };

        DrainOutcome::Completed(self.perform_drain().await)
    }

    async fn perform_drain(&self) -> DrainReport {
        let pending = self.queue.list_pending().await;
        info!("🔄 Draining {} pending action(s)...", pending.len());

        let mut report = DrainReport::new();

        for entry in pending {
            let result = match entry {
                PendingAction::Ready(action) => {
                    let action_type = action.action_type().to_string();
                    match dispatch::replay(self.backend.as_ref(), &action.payload).await {
                        Ok(()) => match self.queue.mark_synced(&action.id).await {
                            Ok(()) => {
                                info!("✅ Synced {action_type} action {}", action.id);
                                ActionResult {
                                    id: action.id,
                                    action_type,
                                    status: ActionStatus::Synced,
                                }
                            }
                            Err(e) => {
                                error!("❌ Replayed {action_type} action {} but could not mark it: {e}", action.id);
                                ActionResult {
                                    id: action.id,
                                    action_type,
                                    status: ActionStatus::Failed(e.to_string()),
                                }
                            }
                        },
                        Err(e) => {
                            warn!("❌ Failed to sync {action_type} action {}: {e}", action.id);
                            ActionResult {
                                id: action.id,
                                action_type,
                                status: ActionStatus::Failed(e.to_string()),
                            }
                        }
                    }
                }
                PendingAction::Undecodable {
                    id,
                    action_type,
                    reason,
                    ..
                } => {
                    warn!("⚠️  Skipping action {id} ({action_type}): {reason}");
                    ActionResult {
                        id,
                        action_type,
                        status: ActionStatus::Skipped(reason),
                    }
                }
            };
            report.add(result);
        }

        report.compacted = match self.queue.compact().await {
            Ok(removed) => removed,
            Err(e) => {
                error!("❌ Failed to compact the action log: {e}");
                0
            }
        };
        report.finished_at = Utc::now();
        write_json(self.store.as_ref(), CACHE_KEY_LAST_SYNC, &report.finished_at).await;

        info!(
            "Drain complete. Synced: {}, Failed: {}, Skipped: {}",
            report.succeeded, report.failed, report.skipped
        );

        if self.refresh_after_drain && report.succeeded > 0 {
            self.refresh_task_cache().await;
        }

        report
    }

    /// Replaces the cached task snapshot with a fresh remote listing.
    ///
    /// Best effort: a failed fetch keeps the previous snapshot.
    pub async fn refresh_task_cache(&self) {
        match self.backend.fetch_tasks(&TaskFilter::default()).await {
            Ok(tasks) => {
                info!("💾 Refreshed {} cached task(s)", tasks.len());
                write_snapshot(self.store.as_ref(), CACHE_KEY_TASKS, tasks).await;
            }
            Err(e) => error!("❌ Failed to refresh task cache: {e}"),
        }
    }
}

#[async_trait::async_trait]
impl ReconnectHandler for SyncEngine {
    async fn on_reconnect(&self) {
        info!("🌐 Back online, draining offline actions");
        if let DrainOutcome::Completed(report) = self.drain().await {
            if !report.all_succeeded() {
                warn!(
                    "{} action(s) still pending after reconnect sync",
                    report.failed + report.skipped
                );
            }
        }
    }
}

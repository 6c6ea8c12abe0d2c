//! Offline-aware data access.
//!
//! [`OfflineDataAccess`] is what UI-facing code talks to. Reads go to the
//! remote service while online and refresh the cache on the way back; when
//! offline, or when the remote read fails, they are served from the cache and
//! flagged as such. Writes go straight to the remote service while online and
//! are queued as offline actions otherwise, so the user is never blocked on
//! the network.

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::future::Future;
use std::sync::Arc;

use crate::backend::{
    Backend, BackendError, Completion, CreateCompletionArgs, CreateTaskArgs, Organization, Requirement, Task,
    TaskFilter, UpdateTaskArgs,
};
use crate::connectivity::ConnectivityMonitor;
use crate::constants::{CACHE_KEY_ORGANIZATIONS, CACHE_KEY_TASKS, STATUS_QUEUED_OFFLINE, STATUS_USING_CACHED_DATA};
use crate::queue::{ActionPayload, ActionQueue, OfflineAction, QueueError};
use crate::storage::{read_snapshot, write_snapshot, CacheStore};
use crate::sync::{DrainOutcome, SyncEngine};

/// Where the data returned by a read came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Fresh from the remote service.
    Live,
    /// From the offline cache. `stale` is set when a live fetch was attempted and failed.
    Cached { stale: bool },
}

/// Data returned by a read, tagged with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> Fetched<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            source: DataSource::Live,
        }
    }

    pub fn cached(data: T, stale: bool) -> Self {
        Self {
            data,
            source: DataSource::Cached { stale },
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self.source, DataSource::Cached { .. })
    }

    /// User-facing notice for data that did not come from a live fetch.
    pub fn notice(&self) -> Option<&'static str> {
        self.is_cached().then_some(STATUS_USING_CACHED_DATA)
    }
}

/// Result of a write issued through the façade.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T> {
    /// The remote service accepted the write.
    Applied(T),
    /// The device is offline; the write was queued and will be replayed.
    Queued(OfflineAction),
}

impl<T> WriteOutcome<T> {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued(_))
    }
}

/// Errors surfaced by write operations.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Snapshot of the offline state for a status indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineStatus {
    pub online: bool,
    pub pending_actions: usize,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Generic read-through: live when online, cache otherwise.
///
/// A failing live fetch falls back to the cache and marks the result stale;
/// the error is logged, never returned.
pub async fn read_through<T, On, OnFut, Off, OffFut, Wb, WbFut>(
    online: bool,
    online_fetch: On,
    offline_fetch: Off,
    write_back: Wb,
) -> Fetched<T>
where
    T: Clone,
    On: FnOnce() -> OnFut,
    OnFut: Future<Output = Result<T, BackendError>>,
    Off: FnOnce() -> OffFut,
    OffFut: Future<Output = T>,
    Wb: FnOnce(T) -> WbFut,
    WbFut: Future<Output = ()>,
{
    if !online {
        return Fetched::cached(offline_fetch().await, false);
    }

    match online_fetch().await {
        Ok(data) => {
            write_back(data.clone()).await;
            Fetched::live(data)
        }
        Err(e) => {
            warn!("{STATUS_USING_CACHED_DATA}: {e}");
            Fetched::cached(offline_fetch().await, true)
        }
    }
}

/// Façade combining the backend, the cache and the action queue.
#[derive(Clone)]
pub struct OfflineDataAccess {
    backend: Arc<dyn Backend>,
    store: Arc<dyn CacheStore>,
    queue: ActionQueue,
    monitor: Arc<ConnectivityMonitor>,
    engine: Arc<SyncEngine>,
}

impl OfflineDataAccess {
    pub fn new(
        backend: Arc<dyn Backend>,
        store: Arc<dyn CacheStore>,
        queue: ActionQueue,
        monitor: Arc<ConnectivityMonitor>,
        engine: Arc<SyncEngine>,
    ) -> Self {
        Self {
            backend,
            store,
            queue,
            monitor,
            engine,
        }
    }

    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// Lists tasks.
    ///
    /// The filter is sent to the server when online and applied to the cached
    /// snapshot when offline. Only unfiltered listings replace the snapshot.
    pub async fn tasks(&self, filter: TaskFilter) -> Fetched<Vec<Task>> {
        let backend = self.backend.as_ref();
        let store = self.store.as_ref();
        let filter = &filter;
        let full_listing = filter.is_empty();

        read_through(
            self.is_online(),
            move || backend.fetch_tasks(filter),
            move || async move {
                read_snapshot::<Task>(store, CACHE_KEY_TASKS)
                    .await
                    .into_iter()
                    .filter(|task| filter.matches(task))
                    .collect()
            },
            move |tasks| async move {
                if full_listing {
                    write_snapshot(store, CACHE_KEY_TASKS, tasks).await;
                }
            },
        )
        .await
    }

    /// Fetches a single task; offline it is looked up in the cached snapshot.
    pub async fn task(&self, task_id: i64) -> Fetched<Option<Task>> {
        let backend = self.backend.as_ref();
        let store = self.store.as_ref();

        read_through(
            self.is_online(),
            move || async move { backend.fetch_task(task_id).await.map(Some) },
            move || async move {
                read_snapshot::<Task>(store, CACHE_KEY_TASKS)
                    .await
                    .into_iter()
                    .find(|task| task.id == task_id)
            },
            |_| async {},
        )
        .await
    }

    /// Lists organizations.
    pub async fn organizations(&self) -> Fetched<Vec<Organization>> {
        let backend = self.backend.as_ref();
        let store = self.store.as_ref();

        read_through(
            self.is_online(),
            move || backend.fetch_organizations(),
            move || read_snapshot::<Organization>(store, CACHE_KEY_ORGANIZATIONS),
            move |organizations| write_snapshot(store, CACHE_KEY_ORGANIZATIONS, organizations),
        )
        .await
    }

    async fn queue_offline<T>(&self, payload: ActionPayload) -> Result<WriteOutcome<T>, AccessError> {
        let action = self.queue.enqueue(payload).await?;
        info!("{STATUS_QUEUED_OFFLINE} ({} {})", action.action_type(), action.id);
        Ok(WriteOutcome::Queued(action))
    }

    pub async fn create_task(&self, args: CreateTaskArgs) -> Result<WriteOutcome<Task>, AccessError> {
        if self.is_online() {
            return Ok(WriteOutcome::Applied(self.backend.create_task(args).await?));
        }
        self.queue_offline(ActionPayload::CreateTask(args)).await
    }

    pub async fn update_task(&self, task_id: i64, changes: UpdateTaskArgs) -> Result<WriteOutcome<Task>, AccessError> {
        if self.is_online() {
            return Ok(WriteOutcome::Applied(self.backend.update_task(task_id, changes).await?));
        }
        self.queue_offline(ActionPayload::UpdateTask { task_id, changes }).await
    }

    pub async fn submit_task(&self, task_id: i64) -> Result<WriteOutcome<Task>, AccessError> {
        if self.is_online() {
            return Ok(WriteOutcome::Applied(self.backend.submit_task(task_id).await?));
        }
        self.queue_offline(ActionPayload::SubmitTask { task_id }).await
    }

    pub async fn set_requirement_completion(
        &self,
        requirement_id: i64,
        completed: bool,
    ) -> Result<WriteOutcome<Requirement>, AccessError> {
        if self.is_online() {
            let requirement = self
                .backend
                .set_requirement_completion(requirement_id, completed)
                .await?;
            return Ok(WriteOutcome::Applied(requirement));
        }
        self.queue_offline(ActionPayload::UpdateRequirement {
            requirement_id,
            completed,
        })
        .await
    }

    pub async fn create_completion(&self, args: CreateCompletionArgs) -> Result<WriteOutcome<Completion>, AccessError> {
        if self.is_online() {
            return Ok(WriteOutcome::Applied(self.backend.create_completion(args).await?));
        }
        self.queue_offline(ActionPayload::CreateCompletion(args)).await
    }

    /// User-triggered sync.
    pub async fn sync_now(&self) -> DrainOutcome {
        self.engine.drain().await
    }

    pub async fn status(&self) -> OfflineStatus {
        OfflineStatus {
            online: self.is_online(),
            pending_actions: self.queue.pending_count().await,
            last_sync: self.engine.last_sync().await,
        }
    }
}

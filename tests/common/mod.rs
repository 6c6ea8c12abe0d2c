#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use taskline::backend::{
    Backend, BackendError, Completion, CreateCompletionArgs, CreateTaskArgs, Organization, Requirement, Task,
    TaskFilter, TaskStatus, UpdateTaskArgs,
};
use taskline::connectivity::ConnectivityMonitor;
use taskline::offline::OfflineDataAccess;
use taskline::queue::ActionQueue;
use taskline::storage::{CacheStore, MemoryCacheStore};
use taskline::sync::SyncEngine;

pub fn task(id: i64, organization_id: Option<i64>) -> Task {
    Task {
        id,
        title: format!("Task {id}"),
        description: None,
        status: TaskStatus::Open,
        organization_id,
        due_date: None,
        requirements: Vec::new(),
        updated_at: None,
    }
}

/// In-process backend that records every call it receives.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    tasks: Mutex<Vec<Task>>,
    organizations: Mutex<Vec<Organization>>,
    gate: Mutex<Option<Arc<Notify>>>,
    next_id: AtomicI64,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            ..Default::default()
        }
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let backend = Self::new();
        *backend.tasks.lock().unwrap() = tasks;
        backend
    }

    pub fn set_organizations(&self, organizations: Vec<Organization>) {
        *self.organizations.lock().unwrap() = organizations;
    }

    /// Make the call with this exact description fail.
    pub fn fail(&self, call: &str) {
        self.failing.lock().unwrap().insert(call.to_string());
    }

    /// Make the call with this exact description panic.
    pub fn panic_on(&self, call: &str) {
        self.panicking.lock().unwrap().insert(call.to_string());
    }

    pub fn recover(&self, call: &str) {
        self.failing.lock().unwrap().remove(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Block every mutation until the returned notify is triggered.
    pub fn hold_mutations(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn record(&self, call: String) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call.clone());
        let panics = self.panicking.lock().unwrap().contains(&call);
        if panics {
            panic!("{call} blew up");
        }
        if self.failing.lock().unwrap().contains(&call) {
            Err(BackendError::Other(format!("{call} rejected")))
        } else {
            Ok(())
        }
    }

    async fn wait_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn backend_type(&self) -> &str {
        "fake"
    }

    async fn fetch_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, BackendError> {
        self.record("fetch_tasks".to_string())?;
        let tasks = self.tasks.lock().unwrap().clone();
        Ok(tasks.into_iter().filter(|task| filter.matches(task)).collect())
    }

    async fn fetch_task(&self, task_id: i64) -> Result<Task, BackendError> {
        self.record(format!("fetch_task({task_id})"))?;
        let tasks = self.tasks.lock().unwrap().clone();
        tasks
            .into_iter()
            .find(|task| task.id == task_id)
            .ok_or_else(|| BackendError::NotFound(format!("task {task_id}")))
    }

    async fn fetch_organizations(&self) -> Result<Vec<Organization>, BackendError> {
        self.record("fetch_organizations".to_string())?;
        Ok(self.organizations.lock().unwrap().clone())
    }

    async fn create_task(&self, args: CreateTaskArgs) -> Result<Task, BackendError> {
        self.wait_gate().await;
        self.record(format!("create_task({})", args.title))?;
        let mut created = task(self.next_id.fetch_add(1, Ordering::SeqCst), args.organization_id);
        created.title = args.title;
        self.tasks.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, task_id: i64, args: UpdateTaskArgs) -> Result<Task, BackendError> {
        self.wait_gate().await;
        self.record(format!("update_task({task_id})"))?;
        let mut updated = task(task_id, None);
        if let Some(title) = args.title {
            updated.title = title;
        }
        Ok(updated)
    }

    async fn submit_task(&self, task_id: i64) -> Result<Task, BackendError> {
        self.wait_gate().await;
        self.record(format!("submit_task({task_id})"))?;
        let mut submitted = task(task_id, None);
        submitted.status = TaskStatus::Submitted;
        Ok(submitted)
    }

    async fn set_requirement_completion(
        &self,
        requirement_id: i64,
        completed: bool,
    ) -> Result<Requirement, BackendError> {
        self.wait_gate().await;
        self.record(format!("set_requirement_completion({requirement_id}, {completed})"))?;
        Ok(Requirement {
            id: requirement_id,
            task_id: 1,
            description: "requirement".to_string(),
            completed,
        })
    }

    async fn create_completion(&self, args: CreateCompletionArgs) -> Result<Completion, BackendError> {
        self.wait_gate().await;
        self.record(format!("create_completion({})", args.task_id))?;
        Ok(Completion {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            task_id: args.task_id,
            requirement_id: args.requirement_id,
            text: None,
            file_url: None,
            created_at: None,
        })
    }
}

/// The offline core wired around a fake backend and an in-memory store.
pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub store: Arc<MemoryCacheStore>,
    pub queue: ActionQueue,
    pub monitor: Arc<ConnectivityMonitor>,
    pub engine: Arc<SyncEngine>,
    pub data: OfflineDataAccess,
}

pub fn harness(backend: FakeBackend, online: bool) -> Harness {
    let backend = Arc::new(backend);
    let store = Arc::new(MemoryCacheStore::new());
    let dyn_backend: Arc<dyn Backend> = backend.clone();
    let dyn_store: Arc<dyn CacheStore> = store.clone();

    let queue = ActionQueue::new(dyn_store.clone());
    let monitor = Arc::new(ConnectivityMonitor::with_initial_state(online));
    let engine = Arc::new(SyncEngine::new(
        dyn_backend.clone(),
        queue.clone(),
        dyn_store.clone(),
        monitor.clone(),
    ));
    monitor.attach_reconnect_handler(&engine);

    let data = OfflineDataAccess::new(dyn_backend, dyn_store, queue.clone(), monitor.clone(), engine.clone());

    Harness {
        backend,
        store,
        queue,
        monitor,
        engine,
        data,
    }
}

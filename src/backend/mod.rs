//! Remote backend abstraction.
//!
//! This module defines the contract the client core consumes from the remote
//! task service, along with the shared data types and error handling. The
//! offline queue and sync engine only ever talk to a [`Backend`] trait object.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub mod factory;
pub mod http;

/// Common error types for backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Backend error: {0}")]
    Other(String),
}

/// Lifecycle state of a task as reported by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Submitted,
    Approved,
    Rejected,
    /// A state this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single checklist requirement attached to a task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: i64,
    pub task_id: i64,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

/// Task representation shared by the remote API and the offline cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub organization_id: Option<i64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Organization a task may belong to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
}

/// Evidence submitted against a task or one of its requirements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub id: i64,
    pub task_id: i64,
    #[serde(default)]
    pub requirement_id: Option<i64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Server-side filters for task listings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilter {
    pub organization_id: Option<i64>,
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.organization_id.is_none() && self.status.is_none()
    }

    /// Applies the filter locally, used when listing from the offline cache.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(organization_id) = self.organization_id {
            if task.organization_id != Some(organization_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        true
    }
}

/// Arguments for creating a new task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskArgs {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Partial update for a task; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Reference to a local file that is uploaded when the completion is sent.
///
/// Only the path is stored; the bytes are read at upload time so a queued
/// completion stays small in the action log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    pub path: PathBuf,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// What a completion carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionContent {
    Text { text: String },
    File { file: FileReference },
}

/// Arguments for submitting a completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateCompletionArgs {
    pub task_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_id: Option<i64>,
    pub content: CompletionContent,
}

/// Backend trait that every remote task service implementation must provide.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the backend type identifier (e.g., "http").
    fn backend_type(&self) -> &str;

    // Reads
    async fn fetch_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, BackendError>;
    async fn fetch_task(&self, task_id: i64) -> Result<Task, BackendError>;
    async fn fetch_organizations(&self) -> Result<Vec<Organization>, BackendError>;

    // Task mutations
    async fn create_task(&self, args: CreateTaskArgs) -> Result<Task, BackendError>;
    async fn update_task(&self, task_id: i64, args: UpdateTaskArgs) -> Result<Task, BackendError>;
    async fn submit_task(&self, task_id: i64) -> Result<Task, BackendError>;

    // Requirement and completion mutations
    async fn set_requirement_completion(
        &self,
        requirement_id: i64,
        completed: bool,
    ) -> Result<Requirement, BackendError>;
    async fn create_completion(&self, args: CreateCompletionArgs) -> Result<Completion, BackendError>;
}

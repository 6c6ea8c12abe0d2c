//! Offline action types.
//!
//! An [`OfflineAction`] is a recorded mutation intent. Its payload is a tagged
//! union keyed by [`ActionType`], so replay can match exhaustively. On disk each
//! action is an [`ActionRecord`] carrying the type name and a JSON payload,
//! which lets records written by a newer client survive a rewrite of the log.
//! Elements that do not even fit the record layout are carried verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::backend::{CreateCompletionArgs, CreateTaskArgs, UpdateTaskArgs};

/// The closed set of deferred operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CreateTask,
    UpdateTask,
    SubmitTask,
    UpdateRequirement,
    CreateCompletion,
}

impl ActionType {
    pub const ALL: [ActionType; 5] = [
        Self::CreateTask,
        Self::UpdateTask,
        Self::SubmitTask,
        Self::UpdateRequirement,
        Self::CreateCompletion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTask => "create_task",
            Self::UpdateTask => "update_task",
            Self::SubmitTask => "submit_task",
            Self::UpdateRequirement => "update_requirement",
            Self::CreateCompletion => "create_completion",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action_type| action_type.as_str() == s)
            .ok_or_else(|| format!("unknown action type '{s}'"))
    }
}

/// Everything needed to replay an action against the remote service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ActionPayload {
    CreateTask(CreateTaskArgs),
    UpdateTask {
        #[serde(rename = "taskId")]
        task_id: i64,
        changes: UpdateTaskArgs,
    },
    SubmitTask {
        #[serde(rename = "taskId")]
        task_id: i64,
    },
    UpdateRequirement {
        #[serde(rename = "requirementId")]
        requirement_id: i64,
        completed: bool,
    },
    CreateCompletion(CreateCompletionArgs),
}

impl ActionPayload {
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::CreateTask(_) => ActionType::CreateTask,
            Self::UpdateTask { .. } => ActionType::UpdateTask,
            Self::SubmitTask { .. } => ActionType::SubmitTask,
            Self::UpdateRequirement { .. } => ActionType::UpdateRequirement,
            Self::CreateCompletion(_) => ActionType::CreateCompletion,
        }
    }

    /// Splits the payload into its type name and JSON body.
    pub(crate) fn to_parts(&self) -> Result<(String, Value), serde_json::Error> {
        let mut tagged = serde_json::to_value(self)?;
        let payload = tagged.get_mut("payload").map(Value::take).unwrap_or(Value::Null);
        Ok((self.action_type().as_str().to_string(), payload))
    }

    /// Rebuilds a payload from its type name and JSON body.
    pub(crate) fn from_parts(action_type: &str, payload: &Value) -> Result<Self, String> {
        let action_type = ActionType::from_str(action_type)?;
        let tagged = serde_json::json!({ "type": action_type.as_str(), "payload": payload });
        serde_json::from_value(tagged).map_err(|e| format!("invalid {action_type} payload: {e}"))
    }
}

/// A decoded, replayable action.
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineAction {
    pub id: String,
    pub payload: ActionPayload,
    pub timestamp: DateTime<Utc>,
    pub synced: bool,
}

impl OfflineAction {
    pub fn action_type(&self) -> ActionType {
        self.payload.action_type()
    }
}

/// A pending entry of the log as seen by the sync engine.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingAction {
    /// Decoded and ready to replay.
    Ready(OfflineAction),
    /// Kept in the log but not replayable by this client.
    Undecodable {
        id: String,
        action_type: String,
        timestamp: Option<DateTime<Utc>>,
        reason: String,
    },
}

impl PendingAction {
    pub fn id(&self) -> &str {
        match self {
            Self::Ready(action) => &action.id,
            Self::Undecodable { id, .. } => id,
        }
    }
}

/// Serialized form of one action in the persisted log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub synced: bool,
}

impl ActionRecord {
    pub(crate) fn from_action(action: &OfflineAction) -> Result<Self, serde_json::Error> {
        let (action_type, payload) = action.payload.to_parts()?;
        Ok(Self {
            id: action.id.clone(),
            action_type,
            payload,
            timestamp: action.timestamp,
            synced: action.synced,
        })
    }

    pub(crate) fn decode(&self) -> PendingAction {
        match ActionPayload::from_parts(&self.action_type, &self.payload) {
            Ok(payload) => PendingAction::Ready(OfflineAction {
                id: self.id.clone(),
                payload,
                timestamp: self.timestamp,
                synced: self.synced,
            }),
            Err(reason) => PendingAction::Undecodable {
                id: self.id.clone(),
                action_type: self.action_type.clone(),
                timestamp: Some(self.timestamp),
                reason,
            },
        }
    }
}

/// One element of the persisted log.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum LogEntry {
    Record(ActionRecord),
    /// Does not fit the record layout; written back exactly as read.
    Foreign(Value),
}

impl LogEntry {
    pub(crate) fn from_value(value: Value) -> Self {
        match serde_json::from_value::<ActionRecord>(value.clone()) {
            Ok(record) => Self::Record(record),
            Err(_) => Self::Foreign(value),
        }
    }

    pub(crate) fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Record(record) => serde_json::to_value(record),
            Self::Foreign(value) => Ok(value.clone()),
        }
    }

    /// Foreign entries count as pending: nothing here can prove they were synced.
    pub(crate) fn is_pending(&self) -> bool {
        match self {
            Self::Record(record) => !record.synced,
            Self::Foreign(_) => true,
        }
    }

    pub(crate) fn decode(&self) -> PendingAction {
        match self {
            Self::Record(record) => record.decode(),
            Self::Foreign(value) => PendingAction::Undecodable {
                id: match value.get("id") {
                    Some(Value::String(id)) => id.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                },
                action_type: value
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                timestamp: value.get("timestamp").and_then(loose_timestamp),
                reason: match serde_json::from_value::<ActionRecord>(value.clone()) {
                    Err(e) => format!("unreadable log record: {e}"),
                    Ok(_) => "unreadable log record".to_string(),
                },
            },
        }
    }
}

/// RFC 3339 text or epoch milliseconds.
fn loose_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|timestamp| timestamp.with_timezone(&Utc)),
        Value::Number(millis) => millis.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

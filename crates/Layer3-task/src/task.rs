//! Task definition and types

use crate::status::TaskStatus;
use chrono::{DateTime, Utc};
use harvester_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a task
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a new random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to run on the platform, immutable once attached to a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Target actor identifier
    pub actor_id: String,

    /// Input payload passed verbatim to the actor
    #[serde(default = "empty_input")]
    pub input_data: Value,

    /// Item cap, carried as data; not enforced by this crate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,

    /// Timeout in seconds, carried as data; not enforced by this crate
    #[serde(rename = "timeout", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn empty_input() -> Value {
    Value::Object(serde_json::Map::new())
}

fn default_timeout_secs() -> u64 {
    300
}

impl TaskConfig {
    /// Create a config; the actor id must be non-empty
    pub fn new(actor_id: impl Into<String>, input_data: Value) -> Result<Self> {
        let actor_id = actor_id.into();
        if actor_id.trim().is_empty() {
            return Err(Error::Validation("actor_id must not be empty".to_string()));
        }

        Ok(Self {
            actor_id,
            input_data,
            max_items: None,
            timeout_secs: default_timeout_secs(),
        })
    }

    /// Set the item cap
    pub fn with_max_items(mut self, max_items: u32) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Set the timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Optional overrides applied to a [`TaskConfig`] at task creation
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    pub max_items: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// A tracked request to execute a remote job and retrieve its results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier
    pub id: TaskId,

    /// Human-readable name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// What to run
    pub config: TaskConfig,

    /// Current status
    pub status: TaskStatus,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When execution began
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When execution reached a terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Run identifier assigned by the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Dataset identifier reported by the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,

    /// Failure detail, set when the task fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Result count probed on completion; 0 in every other state
    #[serde(default)]
    pub result_count: u64,
}

impl Task {
    /// Create a new pending task
    pub fn new(name: impl Into<String>, config: TaskConfig) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            description: None,
            config,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            run_id: None,
            dataset_id: None,
            error_message: None,
            result_count: 0,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the task as running
    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Mark the task as completed successfully
    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the task as failed with an error message
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.error_message = Some(error.into());
        self.completed_at = Some(Utc::now());
    }

    /// Mark the task as cancelled
    pub fn cancel(&mut self) {
        self.status = TaskStatus::Cancelled;
        self.completed_at = Some(Utc::now());
    }

    /// Get execution duration if the task has started
    pub fn duration(&self) -> Option<Duration> {
        let start = self.started_at?;
        let end = self.completed_at.unwrap_or_else(Utc::now);
        (end - start).to_std().ok()
    }
}

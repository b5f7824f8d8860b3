//! Wire-facing types shared by the client trait and its implementations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Run status reported by the platform for a successful run
pub const RUN_STATUS_SUCCEEDED: &str = "SUCCEEDED";

/// Run statuses the platform still considers in flight
pub const RUN_STATUS_TRANSITIONAL: &[&str] = &["READY", "RUNNING", "TIMING-OUT", "ABORTING"];

/// One remote execution of an actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRun {
    /// Run identifier assigned by the platform
    pub id: String,

    /// Platform status string (e.g. "SUCCEEDED", "FAILED", "ABORTED")
    pub status: String,

    /// When the run started on the platform
    pub started_at: Option<DateTime<Utc>>,

    /// When the run finished on the platform
    pub finished_at: Option<DateTime<Utc>>,

    /// Run statistics as reported, untouched
    pub stats: Option<Value>,

    /// Run output object; holds `datasetId` when the run produced a dataset
    pub output: Option<Value>,
}

impl ActorRun {
    /// Dataset identifier from the run output, if the run produced one
    pub fn dataset_id(&self) -> Option<&str> {
        self.output
            .as_ref()
            .and_then(|output| output.get("datasetId"))
            .and_then(|id| id.as_str())
    }

    /// Whether the platform has stopped working on this run
    pub fn is_finished(&self) -> bool {
        !RUN_STATUS_TRANSITIONAL.contains(&self.status.as_str())
    }
}

/// One record fetched from a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetItem {
    /// The record payload
    pub data: Value,

    /// When this client fetched the record
    pub fetched_at: DateTime<Utc>,
}

impl DatasetItem {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            fetched_at: Utc::now(),
        }
    }
}

/// Actor metadata as listed by the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

//! Durable task store
//!
//! An in-memory map of tasks backed by one flat JSON file. The file is read
//! once when the store opens and rewritten in full by `save()`; callers
//! invoke `save()` after every mutation (write-through, no write-behind).
//! Multi-process use is unsupported.

use crate::status::TaskStatus;
use crate::task::{Task, TaskId};
use harvester_foundation::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// File name of the persisted task collection
pub const TASKS_FILE: &str = "tasks.json";

/// What opening the store found on disk
///
/// A malformed file is a recoverable condition: the store starts empty and
/// keeps the diagnostic instead of refusing to boot. A corrupt history must
/// never take the system down with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No persisted file yet
    Fresh,

    /// Loaded this many tasks
    Loaded(usize),

    /// File existed but could not be read or parsed; started empty
    Recovered { error: String },
}

/// Durable mapping from task id to task
pub struct TaskStore {
    tasks: HashMap<TaskId, Task>,
    tasks_file: PathBuf,
    load_outcome: LoadOutcome,
}

impl TaskStore {
    /// Open the store in `data_dir`, creating the directory if needed
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;

        let tasks_file = data_dir.join(TASKS_FILE);
        let (tasks, load_outcome) = load_tasks(&tasks_file);

        match &load_outcome {
            LoadOutcome::Fresh => info!("No task file yet, starting empty"),
            LoadOutcome::Loaded(count) => info!("Loaded {} task(s)", count),
            LoadOutcome::Recovered { error } => {
                error!("Failed to load tasks, starting empty: {}", error)
            }
        }

        Ok(Self {
            tasks,
            tasks_file,
            load_outcome,
        })
    }

    /// What the initial load found
    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    /// Serialize every task and rewrite the persisted file
    pub fn save(&self) -> Result<()> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let content = serde_json::to_string_pretty(&tasks)
            .map_err(|e| Error::Storage(format!("Failed to serialize tasks: {}", e)))?;
        fs::write(&self.tasks_file, content).map_err(|e| {
            Error::Storage(format!(
                "Failed to write {}: {}",
                self.tasks_file.display(),
                e
            ))
        })?;

        debug!("Saved {} task(s)", self.tasks.len());
        Ok(())
    }

    /// Add a task keyed by its id; the id is assumed unique
    pub fn insert(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    /// Get a task by id
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Get a mutable task by id
    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Remove a task by id
    pub fn remove(&mut self, id: &TaskId) -> Result<Task> {
        self.tasks
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("task {}", id)))
    }

    /// List tasks, optionally filtered to one status, most recent first
    pub fn list(&self, status: Option<TaskStatus>) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| status.map_or(true, |s| task.status == s))
            .cloned()
            .collect();

        // Descending creation time; id as tie-break keeps the order stable
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn load_tasks(path: &Path) -> (HashMap<TaskId, Task>, LoadOutcome) {
    if !path.exists() {
        return (HashMap::new(), LoadOutcome::Fresh);
    }

    let parsed: std::result::Result<Vec<Task>, String> = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));

    match parsed {
        Ok(tasks) => {
            let count = tasks.len();
            let map = tasks.into_iter().map(|task| (task.id, task)).collect();
            (map, LoadOutcome::Loaded(count))
        }
        Err(error) => (HashMap::new(), LoadOutcome::Recovered { error }),
    }
}

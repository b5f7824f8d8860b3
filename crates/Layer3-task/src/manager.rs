//! Task Manager - coordinates the store and the remote execution client
//!
//! Owns every task state transition. One operation runs at a time against
//! the remote platform; a single lock around the store keeps mutations and
//! their write-through saves serialized. The lock is never held across the
//! remote call itself.
//!
//! Cancellation is local and advisory: cancelling a RUNNING task marks the
//! record CANCELLED but does not abort the in-flight remote run.

use crate::status::TaskStatus;
use crate::store::TaskStore;
use crate::task::{ConfigOverrides, Task, TaskConfig, TaskId};
use harvester_client::{RemoteClient, RUN_STATUS_SUCCEEDED};
use harvester_foundation::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Task lifecycle manager
///
/// Constructed from its collaborators; no ambient global state. Failures of
/// the expected kind (unknown id, wrong state, remote trouble) are reported
/// through boolean returns and the persisted task record, not raised.
pub struct TaskManager {
    client: Arc<dyn RemoteClient>,
    store: Mutex<TaskStore>,
}

impl TaskManager {
    /// Create a manager around a client and a store
    pub fn new(client: Arc<dyn RemoteClient>, store: TaskStore) -> Self {
        Self {
            client,
            store: Mutex::new(store),
        }
    }

    /// Create a task in PENDING state; no remote call is made
    pub async fn create_task(
        &self,
        name: impl Into<String>,
        actor_id: impl Into<String>,
        input_data: Value,
        description: Option<String>,
        overrides: ConfigOverrides,
    ) -> Result<Task> {
        let mut config = TaskConfig::new(actor_id, input_data)?;
        if let Some(max_items) = overrides.max_items {
            config.max_items = Some(max_items);
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            config.timeout_secs = timeout_secs;
        }

        let mut task = Task::new(name, config);
        if let Some(description) = description {
            task = task.with_description(description);
        }

        let mut store = self.store.lock().await;
        store.insert(task.clone());
        store.save()?;

        info!("Created task: {} ({})", task.name, task.id);
        Ok(task)
    }

    /// Get a task by id
    pub async fn get_task(&self, task_id: TaskId) -> Option<Task> {
        self.store.lock().await.get(&task_id).cloned()
    }

    /// List tasks, optionally filtered to one status, most recent first
    pub async fn list_tasks(&self, status: Option<TaskStatus>) -> Vec<Task> {
        self.store.lock().await.list(status)
    }

    /// Number of tracked tasks
    pub async fn task_count(&self) -> usize {
        self.store.lock().await.len()
    }

    /// Run a PENDING task to a terminal state, blocking until the remote
    /// run finishes
    ///
    /// Returns true iff the task ends up COMPLETED. Remote failures never
    /// escape as errors; they land in the task's status and error message.
    pub async fn run_task(&self, task_id: TaskId) -> bool {
        let (name, actor_id, input) = {
            let mut store = self.store.lock().await;

            let task = match store.get_mut(&task_id) {
                Some(task) => task,
                None => {
                    error!("Task not found: {}", task_id);
                    return false;
                }
            };

            if task.status != TaskStatus::Pending {
                error!("Task {} is {} and cannot be run", task_id, task.status);
                return false;
            }

            if !self.client.is_ready() {
                task.status = TaskStatus::Failed;
                task.error_message = Some("Remote execution client is not ready".to_string());
                error!("Client not ready, task failed: {}", task.name);
                persist(&store);
                return false;
            }

            task.start();
            let snapshot = (
                task.name.clone(),
                task.config.actor_id.clone(),
                task.config.input_data.clone(),
            );
            persist(&store);
            snapshot
        };

        info!("Running task {}: {}", task_id, name);

        let outcome = self.client.run_actor(&actor_id, &input).await;

        // Probe the result count before re-taking the lock. A failed probe
        // degrades to a count of 0, it does not fail the task.
        let probe = match &outcome {
            Ok(run) if run.status == RUN_STATUS_SUCCEEDED => match run.dataset_id() {
                Some(dataset_id) => {
                    let count = match self.client.dataset_items(dataset_id, 1).await {
                        Ok(items) => items.len() as u64,
                        Err(e) => {
                            warn!("Result probe failed for dataset {}: {}", dataset_id, e);
                            0
                        }
                    };
                    Some((dataset_id.to_string(), count))
                }
                None => None,
            },
            _ => None,
        };

        let mut store = self.store.lock().await;
        let task = match store.get_mut(&task_id) {
            Some(task) => task,
            None => {
                warn!("Task {} was deleted while its run was in flight", task_id);
                return false;
            }
        };

        // Terminal states take no further transitions; a cancel that landed
        // while the run was in flight wins.
        if task.status != TaskStatus::Running {
            warn!(
                "Task {} is {} after its run returned; leaving it untouched",
                task_id, task.status
            );
            return false;
        }

        match outcome {
            Ok(run) => {
                task.run_id = Some(run.id.clone());
                if run.status == RUN_STATUS_SUCCEEDED {
                    task.complete();
                    if let Some((dataset_id, count)) = probe {
                        task.dataset_id = Some(dataset_id);
                        task.result_count = count;
                    }
                    info!(
                        "Task completed: {}, result count: {}",
                        name, task.result_count
                    );
                } else {
                    task.status = TaskStatus::Failed;
                    task.error_message = Some(format!("Actor run status: {}", run.status));
                    error!("Task failed: {}, run status: {}", name, run.status);
                }
            }
            Err(e) => {
                task.fail(e.to_string());
                error!("Task run failed: {}: {}", name, e);
            }
        }

        let success = task.status == TaskStatus::Completed;
        persist(&store);
        success
    }

    /// Cancel a PENDING or RUNNING task
    ///
    /// Local bookkeeping only; an in-flight remote run keeps going.
    pub async fn cancel_task(&self, task_id: TaskId) -> bool {
        let mut store = self.store.lock().await;

        let task = match store.get_mut(&task_id) {
            Some(task) => task,
            None => {
                error!("Task not found: {}", task_id);
                return false;
            }
        };

        if !task.status.is_active() {
            error!("Task {} is {} and cannot be cancelled", task_id, task.status);
            return false;
        }

        task.cancel();
        info!("Task cancelled: {}", task.name);
        persist(&store);
        true
    }

    /// Delete a task in any state
    pub async fn delete_task(&self, task_id: TaskId) -> bool {
        let mut store = self.store.lock().await;

        match store.remove(&task_id) {
            Ok(task) => {
                persist(&store);
                info!("Task deleted: {} ({})", task.name, task_id);
                true
            }
            Err(_) => {
                error!("Task not found: {}", task_id);
                false
            }
        }
    }

    /// Fetch up to `limit` result records for a task, payloads only
    ///
    /// Soft-fails to an empty list when the task is unknown, has no dataset,
    /// or the fetch itself fails.
    pub async fn get_task_results(&self, task_id: TaskId, limit: u32) -> Vec<Value> {
        let dataset_id = {
            let store = self.store.lock().await;
            match store.get(&task_id).and_then(|t| t.dataset_id.clone()) {
                Some(dataset_id) => dataset_id,
                None => {
                    error!("Task or dataset not found: {}", task_id);
                    return Vec::new();
                }
            }
        };

        match self.client.dataset_items(&dataset_id, limit).await {
            Ok(items) => items.into_iter().map(|item| item.data).collect(),
            Err(e) => {
                warn!("Failed to fetch dataset {}: {}", dataset_id, e);
                Vec::new()
            }
        }
    }

    /// Download a task's full dataset in the given format
    pub async fn export_task_results(&self, task_id: TaskId, format: &str) -> Option<Vec<u8>> {
        let dataset_id = {
            let store = self.store.lock().await;
            match store.get(&task_id).and_then(|t| t.dataset_id.clone()) {
                Some(dataset_id) => dataset_id,
                None => {
                    error!("Task or dataset not found: {}", task_id);
                    return None;
                }
            }
        };

        match self.client.download_dataset(&dataset_id, format).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Failed to download dataset {}: {}", dataset_id, e);
                None
            }
        }
    }
}

/// Write-through save; failures are logged, the in-memory state stands
fn persist(store: &TaskStore) {
    if let Err(e) = store.save() {
        error!("Failed to persist task store: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use harvester_client::{ActorRun, ClientError, DatasetItem};
    use serde_json::json;
    use std::collections::HashMap;

    struct MockClient {
        ready: bool,
        run_response: std::result::Result<ActorRun, ClientError>,
        datasets: HashMap<String, Vec<Value>>,
    }

    impl MockClient {
        fn succeeding(dataset_id: &str, records: Vec<Value>) -> Self {
            let mut datasets = HashMap::new();
            datasets.insert(dataset_id.to_string(), records);
            Self {
                ready: true,
                run_response: Ok(ActorRun {
                    id: "run_1".to_string(),
                    status: RUN_STATUS_SUCCEEDED.to_string(),
                    started_at: None,
                    finished_at: None,
                    stats: None,
                    output: Some(json!({ "datasetId": dataset_id })),
                }),
                datasets,
            }
        }

        fn succeeding_without_dataset() -> Self {
            Self {
                ready: true,
                run_response: Ok(ActorRun {
                    id: "run_1".to_string(),
                    status: RUN_STATUS_SUCCEEDED.to_string(),
                    started_at: None,
                    finished_at: None,
                    stats: None,
                    output: None,
                }),
                datasets: HashMap::new(),
            }
        }

        fn finishing_with_status(status: &str) -> Self {
            Self {
                ready: true,
                run_response: Ok(ActorRun {
                    id: "run_1".to_string(),
                    status: status.to_string(),
                    started_at: None,
                    finished_at: None,
                    stats: None,
                    output: None,
                }),
                datasets: HashMap::new(),
            }
        }

        fn erroring() -> Self {
            Self {
                ready: true,
                run_response: Err(ClientError::Network("connection refused".to_string())),
                datasets: HashMap::new(),
            }
        }

        fn unready() -> Self {
            Self {
                ready: false,
                run_response: Err(ClientError::NotConfigured("no token".to_string())),
                datasets: HashMap::new(),
            }
        }
    }

    #[async_trait]
    impl RemoteClient for MockClient {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn run_actor(
            &self,
            _actor_id: &str,
            _input: &Value,
        ) -> std::result::Result<ActorRun, ClientError> {
            self.run_response.clone()
        }

        async fn run_status(&self, _run_id: &str) -> std::result::Result<String, ClientError> {
            self.run_response.clone().map(|run| run.status)
        }

        // Returns every record regardless of limit; the probe contract uses
        // the returned length as the count
        async fn dataset_items(
            &self,
            dataset_id: &str,
            _limit: u32,
        ) -> std::result::Result<Vec<DatasetItem>, ClientError> {
            Ok(self
                .datasets
                .get(dataset_id)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(DatasetItem::new)
                .collect())
        }

        async fn download_dataset(
            &self,
            dataset_id: &str,
            format: &str,
        ) -> std::result::Result<Vec<u8>, ClientError> {
            if self.datasets.contains_key(dataset_id) {
                Ok(format!("{}:{}", dataset_id, format).into_bytes())
            } else {
                Err(ClientError::NotFound(dataset_id.to_string()))
            }
        }
    }

    fn manager_with(client: MockClient) -> (TaskManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(dir.path()).unwrap();
        (TaskManager::new(Arc::new(client), store), dir)
    }

    async fn create(manager: &TaskManager) -> Task {
        manager
            .create_task(
                "t1",
                "apify/web-scraper",
                json!({ "startUrl": "https://example.com" }),
                None,
                ConfigOverrides::default(),
            )
            .await
            .unwrap()
    }

    fn five_records() -> Vec<Value> {
        (0..5).map(|i| json!({ "rank": i })).collect()
    }

    #[tokio::test]
    async fn test_create_task() {
        let (manager, _dir) = manager_with(MockClient::unready());

        let task = manager
            .create_task(
                "crawl",
                "actor-1",
                json!({}),
                Some("nightly crawl".to_string()),
                ConfigOverrides {
                    max_items: Some(50),
                    timeout_secs: Some(120),
                },
            )
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.config.max_items, Some(50));
        assert_eq!(task.config.timeout_secs, 120);

        let fetched = manager.get_task(task.id).await.unwrap();
        assert_eq!(fetched.name, "crawl");
        assert_eq!(manager.list_tasks(None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_task_rejects_empty_actor_id() {
        let (manager, _dir) = manager_with(MockClient::unready());

        let result = manager
            .create_task("t", "", json!({}), None, ConfigOverrides::default())
            .await;

        assert!(matches!(
            result,
            Err(harvester_foundation::Error::Validation(_))
        ));
        assert_eq!(manager.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_run_success_with_dataset() {
        let (manager, _dir) = manager_with(MockClient::succeeding("ds_1", five_records()));
        let task = create(&manager).await;

        assert!(manager.run_task(task.id).await);

        let task = manager.get_task(task.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.dataset_id.as_deref(), Some("ds_1"));
        assert_eq!(task.run_id.as_deref(), Some("run_1"));
        assert_eq!(task.result_count, 5);
        assert!(task.started_at.is_some());
        assert!(task.completed_at >= task.started_at);
        assert!(task.error_message.is_none());
    }

    #[tokio::test]
    async fn test_run_success_without_dataset() {
        let (manager, _dir) = manager_with(MockClient::succeeding_without_dataset());
        let task = create(&manager).await;

        assert!(manager.run_task(task.id).await);

        let task = manager.get_task(task.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.dataset_id.is_none());
        assert_eq!(task.result_count, 0);
    }

    #[tokio::test]
    async fn test_run_twice_rejects_second_call() {
        let (manager, _dir) = manager_with(MockClient::succeeding("ds_1", five_records()));
        let task = create(&manager).await;

        assert!(manager.run_task(task.id).await);
        let after_first = manager.get_task(task.id).await.unwrap();

        assert!(!manager.run_task(task.id).await);
        let after_second = manager.get_task(task.id).await.unwrap();

        assert_eq!(after_second.status, after_first.status);
        assert_eq!(after_second.completed_at, after_first.completed_at);
        assert_eq!(after_second.result_count, after_first.result_count);
    }

    #[tokio::test]
    async fn test_run_remote_error_fails_task() {
        let (manager, _dir) = manager_with(MockClient::erroring());
        let task = create(&manager).await;

        assert!(!manager.run_task(task.id).await);

        let task = manager.get_task(task.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task
            .error_message
            .as_deref()
            .is_some_and(|msg| !msg.is_empty()));
        assert!(task.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_run_with_unready_client_fails_task() {
        let (manager, _dir) = manager_with(MockClient::unready());
        let task = create(&manager).await;

        assert!(!manager.run_task(task.id).await);

        let task = manager.get_task(task.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error_message.is_some());
        // Execution never began
        assert!(task.started_at.is_none());
    }

    #[tokio::test]
    async fn test_run_non_success_status_fails_task() {
        let (manager, _dir) = manager_with(MockClient::finishing_with_status("ABORTED"));
        let task = create(&manager).await;

        assert!(!manager.run_task(task.id).await);

        let task = manager.get_task(task.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.run_id.as_deref(), Some("run_1"));
        assert!(task
            .error_message
            .as_deref()
            .is_some_and(|msg| msg.contains("ABORTED")));
    }

    #[tokio::test]
    async fn test_run_missing_task() {
        let (manager, _dir) = manager_with(MockClient::succeeding("ds_1", vec![]));
        assert!(!manager.run_task(TaskId::new()).await);
    }

    #[tokio::test]
    async fn test_cancel_pending_task() {
        let (manager, _dir) = manager_with(MockClient::unready());
        let task = create(&manager).await;

        assert!(manager.cancel_task(task.id).await);

        let task = manager.get_task(task.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert!(task.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_completed_task_is_rejected() {
        let (manager, _dir) = manager_with(MockClient::succeeding("ds_1", five_records()));
        let task = create(&manager).await;
        assert!(manager.run_task(task.id).await);
        let before = manager.get_task(task.id).await.unwrap();

        assert!(!manager.cancel_task(task.id).await);

        let after = manager.get_task(task.id).await.unwrap();
        assert_eq!(after.status, TaskStatus::Completed);
        assert_eq!(after.completed_at, before.completed_at);
    }

    #[tokio::test]
    async fn test_cancel_missing_task() {
        let (manager, _dir) = manager_with(MockClient::unready());
        assert!(!manager.cancel_task(TaskId::new()).await);
    }

    #[tokio::test]
    async fn test_delete_task_any_state() {
        let (manager, _dir) = manager_with(MockClient::succeeding("ds_1", five_records()));

        let completed = create(&manager).await;
        assert!(manager.run_task(completed.id).await);
        assert!(manager.delete_task(completed.id).await);
        assert!(manager.get_task(completed.id).await.is_none());

        let pending = create(&manager).await;
        assert!(manager.delete_task(pending.id).await);
        assert!(manager.get_task(pending.id).await.is_none());

        assert!(!manager.delete_task(pending.id).await);
    }

    #[tokio::test]
    async fn test_get_task_results_strips_metadata() {
        let records = five_records();
        let (manager, _dir) = manager_with(MockClient::succeeding("ds_1", records.clone()));
        let task = create(&manager).await;
        assert!(manager.run_task(task.id).await);

        let results = manager.get_task_results(task.id, 100).await;
        assert_eq!(results, records);
    }

    #[tokio::test]
    async fn test_get_task_results_soft_fails() {
        let (manager, _dir) = manager_with(MockClient::unready());

        // Unknown task
        assert!(manager.get_task_results(TaskId::new(), 10).await.is_empty());

        // Known task without a dataset
        let task = create(&manager).await;
        assert!(manager.get_task_results(task.id, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_export_task_results() {
        let (manager, _dir) = manager_with(MockClient::succeeding("ds_1", five_records()));
        let task = create(&manager).await;
        assert!(manager.run_task(task.id).await);

        let bytes = manager.export_task_results(task.id, "csv").await.unwrap();
        assert_eq!(bytes, b"ds_1:csv");

        assert!(manager
            .export_task_results(TaskId::new(), "csv")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_run_is_persisted_through() {
        let (manager, dir) = manager_with(MockClient::succeeding("ds_1", five_records()));
        let task = create(&manager).await;
        assert!(manager.run_task(task.id).await);
        drop(manager);

        let store = TaskStore::open(dir.path()).unwrap();
        let reloaded = store.get(&task.id).unwrap();
        assert_eq!(reloaded.status, TaskStatus::Completed);
        assert_eq!(reloaded.dataset_id.as_deref(), Some("ds_1"));
        assert_eq!(reloaded.result_count, 5);
    }
}

//! Apify HTTP client
//!
//! Implements [`RemoteClient`] against the Apify v2 API. `run_actor` holds
//! the caller until the platform reports a final run status: the initial
//! request asks the platform to wait for the run, and the client keeps
//! re-polling the run resource for as long as the status stays transitional.

use crate::error::ClientError;
use crate::remote::RemoteClient;
use crate::types::{ActorInfo, ActorRun, DatasetItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harvester_foundation::{ApifyConfig, Settings};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Seconds the platform is asked to hold a run request open
const WAIT_FOR_FINISH_SECS: u64 = 60;

/// Pause between run status polls once a wait window expires
const POLL_DELAY: Duration = Duration::from_secs(2);

/// Apify platform client
pub struct ApifyClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApifyClient {
    /// Create a configured client
    pub fn new(config: &ApifyConfig) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs.max(
                    // The long-poll on a run must be able to outlive the wait window
                    WAIT_FOR_FINISH_SECS + 10,
                )))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Some(config.api_token.clone()),
        }
    }

    /// Create a client without credentials
    ///
    /// Constructs fine but reports `is_ready() == false`; every call fails
    /// with [`ClientError::NotConfigured`].
    pub fn unconfigured() -> Self {
        Self {
            http: Client::new(),
            base_url: harvester_foundation::DEFAULT_BASE_URL.to_string(),
            token: None,
        }
    }

    /// Build from process settings, tolerating a missing platform half
    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.apify {
            Some(config) => Self::new(config),
            None => {
                warn!("Apify is not configured; client starts unready");
                Self::unconfigured()
            }
        }
    }

    fn token(&self) -> Result<&str, ClientError> {
        self.token
            .as_deref()
            .ok_or_else(|| ClientError::NotConfigured("no API token".to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Verify credentials by fetching the account behind the token
    pub async fn test_connection(&self) -> bool {
        let token = match self.token() {
            Ok(token) => token,
            Err(_) => return false,
        };

        let result = self
            .http
            .get(self.url("/users/me"))
            .bearer_auth(token)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                let username = response
                    .json::<Envelope<UserData>>()
                    .await
                    .ok()
                    .and_then(|e| e.data.username)
                    .unwrap_or_else(|| "unknown".to_string());
                info!("Connection test succeeded, user: {}", username);
                true
            }
            Ok(response) => {
                warn!("Connection test failed: HTTP {}", response.status());
                false
            }
            Err(e) => {
                warn!("Connection test failed: {}", e);
                false
            }
        }
    }

    /// List actors owned by the account
    pub async fn list_actors(&self, limit: u32) -> Result<Vec<ActorInfo>, ClientError> {
        let token = self.token()?;

        let response = self
            .http
            .get(self.url("/acts"))
            .query(&[("limit", limit.to_string()), ("my", "true".to_string())])
            .bearer_auth(token)
            .send()
            .await?;
        let response = check(response).await?;

        let page: Envelope<Page<ActorInfo>> = response.json().await?;
        debug!("Listed {} actors", page.data.items.len());
        Ok(page.data.items)
    }

    /// Fetch metadata for one actor
    pub async fn get_actor_info(&self, actor_id: &str) -> Result<ActorInfo, ClientError> {
        let token = self.token()?;

        let response = self
            .http
            .get(self.url(&format!("/acts/{}", actor_path(actor_id))))
            .bearer_auth(token)
            .send()
            .await?;
        let response = check(response).await?;

        let info: Envelope<ActorInfo> = response.json().await?;
        Ok(info.data)
    }

    async fn fetch_run(&self, run_id: &str, wait_secs: u64) -> Result<ActorRun, ClientError> {
        let token = self.token()?;

        let response = self
            .http
            .get(self.url(&format!("/actor-runs/{}", run_id)))
            .query(&[("waitForFinish", wait_secs.to_string())])
            .bearer_auth(token)
            .send()
            .await?;
        let response = check(response).await?;

        let run: Envelope<RunData> = response.json().await?;
        Ok(run.data.into())
    }
}

#[async_trait]
impl RemoteClient for ApifyClient {
    fn is_ready(&self) -> bool {
        self.token.is_some()
    }

    async fn run_actor(&self, actor_id: &str, input: &Value) -> Result<ActorRun, ClientError> {
        let token = self.token()?;

        info!("Starting actor run: {}", actor_id);

        let response = self
            .http
            .post(self.url(&format!("/acts/{}/runs", actor_path(actor_id))))
            .query(&[("waitForFinish", WAIT_FOR_FINISH_SECS.to_string())])
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;
        let response = check(response).await?;

        let mut run: ActorRun = response.json::<Envelope<RunData>>().await?.data.into();

        // The wait window caps out well below long scrapes; keep re-polling
        // until the platform reports a final status.
        while !run.is_finished() {
            debug!("Run {} still {}, polling", run.id, run.status);
            tokio::time::sleep(POLL_DELAY).await;
            run = self.fetch_run(&run.id, WAIT_FOR_FINISH_SECS).await?;
        }

        info!("Actor run finished: {}, status: {}", run.id, run.status);
        Ok(run)
    }

    async fn run_status(&self, run_id: &str) -> Result<String, ClientError> {
        let run = self.fetch_run(run_id, 0).await?;
        Ok(run.status)
    }

    async fn dataset_items(
        &self,
        dataset_id: &str,
        limit: u32,
    ) -> Result<Vec<DatasetItem>, ClientError> {
        let token = self.token()?;

        let response = self
            .http
            .get(self.url(&format!("/datasets/{}/items", dataset_id)))
            .query(&[("limit", limit.to_string()), ("clean", "true".to_string())])
            .bearer_auth(token)
            .send()
            .await?;
        let response = check(response).await?;

        let records: Vec<Value> = response.json().await?;
        debug!("Fetched {} items from dataset {}", records.len(), dataset_id);
        Ok(records.into_iter().map(DatasetItem::new).collect())
    }

    async fn download_dataset(
        &self,
        dataset_id: &str,
        format: &str,
    ) -> Result<Vec<u8>, ClientError> {
        let token = self.token()?;

        let response = self
            .http
            .get(self.url(&format!("/datasets/{}/items", dataset_id)))
            .query(&[("format", format)])
            .bearer_auth(token)
            .send()
            .await?;
        let response = check(response).await?;

        let bytes = response.bytes().await?;
        info!(
            "Downloaded dataset {} as {} ({} bytes)",
            dataset_id,
            format,
            bytes.len()
        );
        Ok(bytes.to_vec())
    }
}

/// Actor ids may be "username/actor-name"; the path form uses "~"
fn actor_path(actor_id: &str) -> String {
    actor_id.replace('/', "~")
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::from_http_status(status.as_u16(), &body))
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UserData {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunData {
    id: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    stats: Option<Value>,
    default_dataset_id: Option<String>,
}

impl From<RunData> for ActorRun {
    fn from(run: RunData) -> Self {
        ActorRun {
            id: run.id,
            status: run.status,
            started_at: run.started_at,
            finished_at: run.finished_at,
            stats: run.stats,
            output: run
                .default_dataset_id
                .map(|id| json!({ "datasetId": id })),
        }
    }
}

//! Remote execution client trait
//!
//! The task layer depends on this seam, never on a concrete HTTP client.
//! Implementations are expected to wait out the remote run inside
//! `run_actor`; callers treat it as one blocking call.

use crate::error::ClientError;
use crate::types::{ActorRun, DatasetItem};
use async_trait::async_trait;
use serde_json::Value;

/// Capability contract for the remote scraping platform
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Whether the client is configured and able to make calls
    fn is_ready(&self) -> bool;

    /// Trigger an actor run and wait for it to reach a final status
    async fn run_actor(&self, actor_id: &str, input: &Value) -> Result<ActorRun, ClientError>;

    /// Fetch the current status string of a run
    async fn run_status(&self, run_id: &str) -> Result<String, ClientError>;

    /// Fetch up to `limit` records from a dataset
    async fn dataset_items(
        &self,
        dataset_id: &str,
        limit: u32,
    ) -> Result<Vec<DatasetItem>, ClientError>;

    /// Download a full dataset in the given serialization format
    async fn download_dataset(&self, dataset_id: &str, format: &str)
        -> Result<Vec<u8>, ClientError>;
}

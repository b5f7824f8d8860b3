//! # harvester-client
//!
//! Remote execution client for Harvester.
//!
//! The task layer talks to the scraping platform through the [`RemoteClient`]
//! trait; [`ApifyClient`] is the production implementation over the Apify v2
//! HTTP API. A client constructed without credentials stays usable but
//! reports itself unready, so a token-less process can still inspect its
//! local task records.

pub mod apify;
pub mod error;
pub mod remote;
pub mod types;

pub use apify::ApifyClient;
pub use error::ClientError;
pub use remote::RemoteClient;
pub use types::{ActorInfo, ActorRun, DatasetItem, RUN_STATUS_SUCCEEDED};

// External draft feed: the read-only query interface the tracker polls.

pub mod sleeper;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::draft::order::DraftOrder;
use crate::draft::pick::DraftPick;

/// The feed could not be queried. Recoverable: the caller keeps its previous
/// snapshot and retries on the next refresh.
#[derive(Debug, Error)]
pub enum FeedUnavailable {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("feed did not respond within {secs}s")]
    Timeout { secs: u64 },

    #[error("feed unavailable: {0}")]
    Other(String),
}

/// League/draft metadata published by the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftMetadata {
    /// Feed-side identifier of the draft.
    pub draft_id: String,
    /// Seat order and draft type. `None` until the league sets an order.
    pub order: Option<DraftOrder>,
    /// Participant id -> display name.
    pub participant_names: BTreeMap<String, String>,
}

/// Read-only source of draft picks and metadata.
#[async_trait]
pub trait DraftFeed: Send + Sync {
    /// The full list of picks made so far, in any order.
    async fn fetch_picks(&self) -> Result<Vec<DraftPick>, FeedUnavailable>;

    /// Draft metadata, or `None` when the league has no draft yet.
    async fn fetch_metadata(&self) -> Result<Option<DraftMetadata>, FeedUnavailable>;
}

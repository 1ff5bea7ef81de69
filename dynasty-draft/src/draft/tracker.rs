// Draft state tracker: polls the feed and rebuilds the DraftState snapshot.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::pick::DraftPick;
use super::state::DraftState;
use crate::feed::{DraftFeed, DraftMetadata, FeedUnavailable};

/// Owns the feed handle and the session-cached draft metadata.
///
/// `refresh` is idempotent: every call fetches the full pick list and
/// derives a fresh `DraftState`, so two refreshes against an unchanged feed
/// produce equal snapshots.
pub struct DraftStateTracker {
    feed: Arc<dyn DraftFeed>,
    participant: String,
    timeout: Duration,
    /// Last metadata seen. Re-fetched on every refresh until it carries a
    /// seat order, then kept for the rest of the session.
    metadata: Option<DraftMetadata>,
}

impl DraftStateTracker {
    pub fn new(feed: Arc<dyn DraftFeed>, participant: &str, timeout: Duration) -> Self {
        DraftStateTracker {
            feed,
            participant: participant.to_string(),
            timeout,
            metadata: None,
        }
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    /// Whether the seat order has been fetched and cached.
    pub fn order_cached(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.order.is_some())
    }

    /// Fetch the latest picks (and metadata while uncached) and derive the
    /// current state. Bounded by the configured timeout.
    pub async fn refresh(&mut self) -> Result<DraftState, FeedUnavailable> {
        let fetch_metadata = !self.order_cached();
        let (picks, metadata) = tokio::time::timeout(self.timeout, self.fetch(fetch_metadata))
            .await
            .map_err(|_| FeedUnavailable::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        if fetch_metadata {
            if let Some(ref meta) = metadata {
                if let Some(ref order) = meta.order {
                    info!(
                        "Draft {} order cached: {} seats, {:?}, rounds {:?}",
                        meta.draft_id,
                        order.len(),
                        order.draft_type,
                        order.rounds
                    );
                }
            }
            if metadata.is_some() {
                self.metadata = metadata;
            }
        }

        let (order, names) = match &self.metadata {
            Some(m) => (m.order.clone(), m.participant_names.clone()),
            None => (None, Default::default()),
        };
        let state = DraftState::derive(&self.participant, picks, order, names);
        debug!(
            "Refreshed draft state: {} picks, phase {:?}",
            state.pick_count(),
            state.phase
        );
        Ok(state)
    }

    async fn fetch(
        &self,
        with_metadata: bool,
    ) -> Result<(Vec<DraftPick>, Option<DraftMetadata>), FeedUnavailable> {
        let metadata = if with_metadata {
            self.feed.fetch_metadata().await?
        } else {
            None
        };
        let picks = self.feed.fetch_picks().await?;
        Ok((picks, metadata))
    }
}

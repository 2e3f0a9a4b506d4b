//! Revision browser facade.
//!
//! Composes the store, the history assembler and the diff engine into the
//! three read operations exposed to clients.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::config::BrowserConfig;
use crate::diff::diff_snapshots;
use crate::history::HistoryAssembler;
use crate::resolver::ResolveError;
use crate::store::RevisionStore;
use crate::types::{ChartId, RevisionDiff, RevisionHistory, RevisionId, Snapshot};

/// Error type for browser operations.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// Store error.
    #[error("Store error: {0}")]
    StoreError(String),
    /// Chain resolution error.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl BrowserError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::StoreError(e.to_string())
    }
}

/// Read-only revision browser over a [`RevisionStore`].
pub struct RevisionBrowser<S: RevisionStore> {
    store: Arc<S>,
    config: BrowserConfig,
}

impl<S: RevisionStore> RevisionBrowser<S> {
    /// Create a browser with default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, BrowserConfig::default())
    }

    /// Create a browser with explicit configuration.
    pub fn with_config(store: Arc<S>, config: BrowserConfig) -> Self {
        Self { store, config }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Grouped revision history of `chart_id` for revisions started on `day`.
    ///
    /// A chart with no revisions that day yields an empty history.
    pub async fn history(&self, chart_id: ChartId, day: NaiveDate) -> Result<RevisionHistory, BrowserError> {
        let records = self
            .store
            .fetch_records_for_chart_on_date(chart_id, day)
            .await
            .map_err(BrowserError::from_store)?;

        if records.is_empty() {
            return Ok(RevisionHistory::empty(chart_id, day));
        }

        let history = HistoryAssembler::new(self.store.as_ref())
            .with_max_chain_depth(self.config.max_chain_depth)
            .assemble(chart_id, day, records)
            .await?;
        Ok(history)
    }

    /// Full snapshot of one revision. Non-positive ids are never found.
    pub async fn revision(&self, id: RevisionId) -> Result<Option<Snapshot>, BrowserError> {
        if id.get() <= 0 {
            return Ok(None);
        }
        self.store
            .fetch_snapshot_by_id(id)
            .await
            .map_err(BrowserError::from_store)
    }

    /// Entity-level diff between two revisions.
    ///
    /// `Ok(None)` when either revision does not exist.
    pub async fn diff(&self, from: RevisionId, to: RevisionId) -> Result<Option<RevisionDiff>, BrowserError> {
        let Some(from_snapshot) = self.revision(from).await? else {
            debug!(revision_id = %from, "Diff source revision not found");
            return Ok(None);
        };
        let Some(to_snapshot) = self.revision(to).await? else {
            debug!(revision_id = %to, "Diff target revision not found");
            return Ok(None);
        };

        Ok(Some(diff_snapshots(&from_snapshot, &to_snapshot, Utc::now())))
    }

    /// Whether the store is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.store.is_healthy().await
    }
}

//! In-memory revision store for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{day_window, RevisionStore};
use crate::types::{ChartId, RevisionId, RevisionRecord, Snapshot};

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// Never produced; lookups of missing ids yield `Ok(None)`.
    #[error("In-memory store error: {0}")]
    Unavailable(String),
}

/// In-memory revision store for testing.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Default)]
pub struct InMemoryRevisionStore {
    /// Records by ID.
    records: BTreeMap<RevisionId, RevisionRecord>,
    /// Full snapshots by ID.
    snapshots: BTreeMap<RevisionId, Snapshot>,
    /// Number of single-record lookups served.
    record_lookups: AtomicUsize,
}

impl InMemoryRevisionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a revision record without content.
    pub fn add_record(&mut self, record: RevisionRecord) {
        self.records.insert(record.id, record);
    }

    /// Add a snapshot; its record becomes visible to record lookups too.
    pub fn add_snapshot(&mut self, snapshot: Snapshot) {
        self.records.insert(snapshot.record.id, snapshot.record.clone());
        self.snapshots.insert(snapshot.record.id, snapshot);
    }

    /// Get number of records.
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Number of `fetch_record_by_id` calls served so far.
    pub fn record_lookups(&self) -> usize {
        self.record_lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RevisionStore for InMemoryRevisionStore {
    type Error = InMemoryError;

    async fn fetch_records_for_chart_on_date(
        &self,
        chart_id: ChartId,
        day: NaiveDate,
    ) -> Result<Vec<RevisionRecord>, Self::Error> {
        let (from, to) = day_window(day);
        Ok(self
            .records
            .values()
            .filter(|r| r.chart_id == chart_id)
            .filter(|r| r.started_at >= from && r.started_at < to)
            .filter(|r| !r.is_deleted())
            .cloned()
            .collect())
    }

    async fn fetch_record_by_id(&self, id: RevisionId) -> Result<Option<RevisionRecord>, Self::Error> {
        self.record_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.records.get(&id).cloned())
    }

    async fn fetch_snapshot_by_id(&self, id: RevisionId) -> Result<Option<Snapshot>, Self::Error> {
        Ok(self.snapshots.get(&id).cloned())
    }
}

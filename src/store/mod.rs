//! Revision storage backends.
//!
//! The core never queries persistence directly; it consumes the three
//! lookups of [`RevisionStore`].

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::types::{ChartId, RevisionId, RevisionRecord, Snapshot};

/// Trait for revision storage backends.
///
/// All lookups are read-only. Absence is `Ok(None)`, never an error.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync;

    /// Fetch the chart's revisions started on `day` (UTC), excluding
    /// logically deleted ones. Ordered by revision id.
    async fn fetch_records_for_chart_on_date(
        &self,
        chart_id: ChartId,
        day: NaiveDate,
    ) -> Result<Vec<RevisionRecord>, Self::Error>;

    /// Fetch a single revision record by id.
    async fn fetch_record_by_id(&self, id: RevisionId) -> Result<Option<RevisionRecord>, Self::Error>;

    /// Fetch the full snapshot of a revision by id.
    async fn fetch_snapshot_by_id(&self, id: RevisionId) -> Result<Option<Snapshot>, Self::Error>;

    /// Whether the backend is reachable.
    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Half-open UTC window `[day 00:00, next day 00:00)`.
pub fn day_window(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = day
        .checked_add_days(Days::new(1))
        .map(|next| next.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

pub use memory::InMemoryRevisionStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresRevisionStore;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_window_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = day_window(day);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }
}

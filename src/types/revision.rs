//! Revision record types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status code marking a logically deleted revision.
pub const STATUS_DELETED: &str = "D";

/// Identifier of a patient chart ("Karte").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(i64);

impl ChartId {
    /// Create a new ChartId.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one stored chart document version.
///
/// Implements `Ord` so chains and groups order deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(i64);

impl RevisionId {
    /// Create a new RevisionId.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Interpret a raw parent link. Zero and negative links mean "no parent".
    pub fn parent_link(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Get the raw identifier.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RevisionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Immutable view of a persisted chart document version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionRecord {
    /// Unique revision identifier.
    pub id: RevisionId,
    /// Predecessor in the edit chain, `None` for a root.
    pub parent_id: Option<RevisionId>,
    /// Chart this revision belongs to.
    pub chart_id: ChartId,
    /// Confirmation time; `None` while the revision is not finalized.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Time editing of this revision started.
    pub started_at: DateTime<Utc>,
    /// Single-character status code.
    pub status: String,
    /// Document type (e.g. `karte`).
    pub doc_type: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// User who created the revision.
    pub creator_user_id: Option<String>,
}

impl RevisionRecord {
    /// Create a finalized-status record with no descriptive metadata.
    ///
    /// `parent_link` follows the storage convention: values `<= 0` mean root.
    pub fn new(
        id: i64,
        parent_link: i64,
        chart_id: ChartId,
        started_at: DateTime<Utc>,
        confirmed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: RevisionId::new(id),
            parent_id: RevisionId::parent_link(parent_link),
            chart_id,
            confirmed_at,
            started_at,
            status: "F".to_string(),
            doc_type: None,
            title: None,
            creator_user_id: None,
        }
    }

    /// Set the status code.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Set document type and title.
    pub fn with_doc_info(mut self, doc_type: impl Into<String>, title: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self.title = Some(title.into());
        self
    }

    /// Set the creating user.
    pub fn with_creator(mut self, user_id: impl Into<String>) -> Self {
        self.creator_user_id = Some(user_id.into());
        self
    }

    /// Whether this revision is logically deleted.
    pub fn is_deleted(&self) -> bool {
        self.status == STATUS_DELETED
    }

    /// Whether this revision starts a chain.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Format a timestamp as an ISO-8601 UTC instant (`2024-03-01T09:00:00Z`).
///
/// Fractional seconds are only printed when present.
pub fn format_instant(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parent_link_normalization() {
        assert_eq!(RevisionId::parent_link(0), None);
        assert_eq!(RevisionId::parent_link(-4), None);
        assert_eq!(RevisionId::parent_link(7), Some(RevisionId::new(7)));
    }

    #[test]
    fn test_revision_id_ordering() {
        assert!(RevisionId::new(100) < RevisionId::new(101));
    }

    #[test]
    fn test_format_instant() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(format_instant(&at), "2024-03-01T09:00:00Z");

        let with_millis = at + chrono::Duration::milliseconds(250);
        assert_eq!(format_instant(&with_millis), "2024-03-01T09:00:00.250Z");
    }

    #[test]
    fn test_deleted_status() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let record = RevisionRecord::new(1, 0, ChartId::new(42), at, None);
        assert!(!record.is_deleted());
        assert!(record.is_root());
        assert!(record.with_status(STATUS_DELETED).is_deleted());
    }
}

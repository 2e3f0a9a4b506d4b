//! Diff response shapes.

use serde::{Deserialize, Serialize};

use super::revision::{format_instant, RevisionId, RevisionRecord};

/// Identity and state of one side of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSide {
    /// Revision identifier.
    pub revision_id: RevisionId,
    /// ISO-8601 confirmation instant, `None` if never confirmed.
    pub confirmed_at: Option<String>,
    /// Status code.
    pub status: String,
}

impl From<&RevisionRecord> for RevisionSide {
    fn from(record: &RevisionRecord) -> Self {
        Self {
            revision_id: record.id,
            confirmed_at: record.confirmed_at.as_ref().map(format_instant),
            status: record.status.clone(),
        }
    }
}

/// Metadata about both sides of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    /// Older side.
    pub from: RevisionSide,
    /// Newer side.
    pub to: RevisionSide,
    /// Entity keys fingerprinted on the "from" side, in map order.
    pub module_entities_from: Vec<String>,
    /// Entity keys fingerprinted on the "to" side, in map order.
    pub module_entities_to: Vec<String>,
    /// Number of changed entity keys.
    pub changed_entities_count: usize,
}

/// Content-level difference between two revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionDiff {
    /// Older side.
    pub from_revision_id: RevisionId,
    /// Newer side.
    pub to_revision_id: RevisionId,
    /// Keys whose digest differs or that exist on one side only.
    pub changed_entities: Vec<String>,
    /// Side metadata and counts.
    pub summary: DiffSummary,
    /// ISO-8601 instant the diff was computed.
    pub generated_at: String,
}

impl RevisionDiff {
    /// Whether nothing changed between the two revisions.
    pub fn is_empty(&self) -> bool {
        self.changed_entities.is_empty()
    }

    /// Whether `key` is among the changed entities.
    pub fn changed(&self, key: &str) -> bool {
        self.changed_entities.iter().any(|k| k == key)
    }
}

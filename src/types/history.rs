//! Revision history response shapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::revision::{format_instant, ChartId, RevisionId, RevisionRecord};

/// One revision inside a [`RevisionGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionEntry {
    /// Revision identifier.
    pub revision_id: RevisionId,
    /// Direct predecessor, `None` for a chain root.
    pub parent_revision_id: Option<RevisionId>,
    /// Root of the chain this revision belongs to.
    pub root_revision_id: RevisionId,
    /// ISO-8601 confirmation instant, `None` if never confirmed.
    pub confirmed_at: Option<String>,
    /// ISO-8601 start instant.
    pub started_at: Option<String>,
    /// Status code.
    pub status: String,
    /// Document type.
    pub doc_type: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// Creating user.
    pub creator_user_id: Option<String>,
}

impl RevisionEntry {
    /// Project a record into an entry of the chain rooted at `root`.
    pub fn from_record(record: &RevisionRecord, root: RevisionId) -> Self {
        Self {
            revision_id: record.id,
            parent_revision_id: record.parent_id,
            root_revision_id: root,
            confirmed_at: record.confirmed_at.as_ref().map(format_instant),
            started_at: Some(format_instant(&record.started_at)),
            status: record.status.clone(),
            doc_type: record.doc_type.clone(),
            title: record.title.clone(),
            creator_user_id: record.creator_user_id.clone(),
        }
    }
}

/// One edit chain created on the requested day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionGroup {
    /// Root of the chain.
    pub root_revision_id: RevisionId,
    /// Latest revision of the chain.
    pub latest_revision_id: RevisionId,
    /// Chart the chain belongs to.
    pub karte_id: ChartId,
    /// Requested day, `YYYY-MM-DD`.
    pub visit_date: String,
    /// Chain members, oldest confirmation first.
    pub items: Vec<RevisionEntry>,
}

impl RevisionGroup {
    /// Revision ids of the items, in item order.
    pub fn item_ids(&self) -> Vec<RevisionId> {
        self.items.iter().map(|item| item.revision_id).collect()
    }
}

/// All revision groups of a chart on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionHistory {
    /// Requested chart.
    pub karte_id: ChartId,
    /// Requested day, `YYYY-MM-DD`.
    pub visit_date: String,
    /// Groups, most recently confirmed first.
    pub groups: Vec<RevisionGroup>,
}

impl RevisionHistory {
    /// Empty history for a chart and day.
    pub fn empty(chart_id: ChartId, day: NaiveDate) -> Self {
        Self {
            karte_id: chart_id,
            visit_date: day.to_string(),
            groups: Vec::new(),
        }
    }

    /// Total number of revisions across all groups.
    pub fn num_revisions(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }
}

//! Content-level revision diffing.
//!
//! Two snapshots are compared through their [`EntityFingerprints`]. A key
//! is changed when its digest differs, including when only one side has it.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use tracing::debug;

use crate::digest::{fingerprint, EntityFingerprints};
use crate::types::{format_instant, DiffSummary, RevisionDiff, RevisionSide, Snapshot};

/// Changed keys between two fingerprint maps.
///
/// Order: keys of `from` in map order, then keys only present in `to`.
pub fn changed_entities(from: &EntityFingerprints, to: &EntityFingerprints) -> Vec<String> {
    let union: IndexSet<&str> = from.keys().chain(to.keys()).collect();
    union
        .into_iter()
        .filter(|key| from.get(key) != to.get(key))
        .map(str::to_string)
        .collect()
}

/// Diff two snapshots, stamping the result with `generated_at`.
pub fn diff_snapshots(from: &Snapshot, to: &Snapshot, generated_at: DateTime<Utc>) -> RevisionDiff {
    let from_prints = fingerprint(from);
    let to_prints = fingerprint(to);
    let changed = changed_entities(&from_prints, &to_prints);

    debug!(
        from_revision_id = %from.record.id,
        to_revision_id = %to.record.id,
        changed = changed.len(),
        "Computed revision diff"
    );

    let summary = DiffSummary {
        from: RevisionSide::from(&from.record),
        to: RevisionSide::from(&to.record),
        module_entities_from: from_prints.keys().map(str::to_string).collect(),
        module_entities_to: to_prints.keys().map(str::to_string).collect(),
        changed_entities_count: changed.len(),
    };

    RevisionDiff {
        from_revision_id: from.record.id,
        to_revision_id: to.record.id,
        changed_entities: changed,
        summary,
        generated_at: format_instant(&generated_at),
    }
}

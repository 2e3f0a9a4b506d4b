//! Core types for revision browsing.

pub mod revision;
pub mod snapshot;
pub mod history;
pub mod diff;

pub use revision::{ChartId, RevisionId, RevisionRecord, format_instant, STATUS_DELETED};
pub use snapshot::{Snapshot, ModuleEntity, SchemaImage, ExternalRef, Attachment};
pub use history::{RevisionEntry, RevisionGroup, RevisionHistory};
pub use diff::{RevisionDiff, DiffSummary, RevisionSide};

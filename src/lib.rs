//! # karte-revisions
//!
//! Revision history browsing for clinical chart documents.
//!
//! Every save of a chart document creates a new immutable revision that
//! links to its predecessor. This crate answers three read-only questions:
//!
//! > Which revisions of a chart were started on a given day, grouped by edit chain?
//!
//! > What does one revision contain?
//!
//! > Which content entities differ between two revisions?
//!
//! ## Architecture
//!
//! ```text
//! RevisionStore (Postgres or Memory)
//!        ↓
//! RootResolver → HistoryAssembler → RevisionHistory
//!        ↓
//! fingerprint → changed_entities → RevisionDiff
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same records → identical groups in identical order
//! - Chain members ordered by confirmation time (unconfirmed last), then id
//! - Same snapshot content → identical fingerprints

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod store;
pub mod resolver;
pub mod history;
pub mod digest;
pub mod diff;
pub mod browser;
pub mod config;
pub mod validation;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    ChartId, RevisionId, RevisionRecord, Snapshot, ModuleEntity, SchemaImage, ExternalRef,
    Attachment, RevisionEntry, RevisionGroup, RevisionHistory, RevisionDiff, DiffSummary,
    RevisionSide, STATUS_DELETED,
};
pub use store::{RevisionStore, InMemoryRevisionStore};
#[cfg(feature = "postgres")]
pub use store::PostgresRevisionStore;
pub use resolver::{RootResolver, RevisionArena, ResolveError, DEFAULT_MAX_CHAIN_DEPTH};
pub use history::{HistoryAssembler, RevisionChain, chain_order, order_chains};
pub use digest::{fingerprint, EntityFingerprints, SCHEMA_KEY, ATTACHMENT_KEY};
pub use diff::{changed_entities, diff_snapshots};
pub use browser::{RevisionBrowser, BrowserError};
pub use config::{BrowserConfig, ServiceConfig, LogFormat};
pub use validation::{ValidationError, VALIDATION_ERROR_CODE};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Schema version of the wire types.
/// Increment on breaking changes to any response type.
pub const REVISION_SCHEMA_VERSION: &str = "1.0.0";

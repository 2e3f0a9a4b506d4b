//! Revision chain resolution.
//!
//! Every revision links to its predecessor through `parent_id`. The root of
//! a chain is the first member with no resolvable parent. Resolution walks
//! the links upward and memoizes the discovered root for every revision on
//! the path, so each chain is walked at most once per request.
//!
//! ## Storage Model
//!
//! Records live in an append-only [`RevisionArena`] and are addressed by
//! arena index. The root cache maps arena index to arena index. Parents that
//! are not part of the day's records are fetched from the store once and
//! appended to the arena.
//!
//! ## Degradation
//!
//! A broken chain never fails resolution:
//!
//! - parent cannot be found anywhere → the last found revision is the root
//! - parent already on the current walk (cycle) → the last found revision is the root
//! - walk longer than `max_depth` → the last found revision is the root

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::store::RevisionStore;
use crate::types::{RevisionId, RevisionRecord};

/// Default cap on chain-walk steps.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 10_000;

/// Error type for chain resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Store error during an external lookup.
    #[error("Store error: {0}")]
    StoreError(String),
}

impl ResolveError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::StoreError(e.to_string())
    }
}

/// Append-only table of revision records indexed by id.
#[derive(Debug, Clone, Default)]
pub struct RevisionArena {
    records: Vec<RevisionRecord>,
    index: HashMap<RevisionId, usize>,
}

impl RevisionArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an arena from records. On duplicate ids the first record wins.
    pub fn from_records(records: impl IntoIterator<Item = RevisionRecord>) -> Self {
        let mut arena = Self::new();
        for record in records {
            arena.push(record);
        }
        arena
    }

    /// Append a record and return its index. Existing ids are not replaced.
    pub fn push(&mut self, record: RevisionRecord) -> usize {
        if let Some(&idx) = self.index.get(&record.id) {
            return idx;
        }
        let idx = self.records.len();
        self.index.insert(record.id, idx);
        self.records.push(record);
        idx
    }

    /// Arena index of a revision.
    pub fn index_of(&self, id: RevisionId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Record at an arena index.
    ///
    /// # Panics
    /// Panics if `idx` was not returned by this arena.
    pub fn record(&self, idx: usize) -> &RevisionRecord {
        &self.records[idx]
    }

    /// Record by revision id.
    pub fn get(&self, id: RevisionId) -> Option<&RevisionRecord> {
        self.index_of(id).map(|idx| &self.records[idx])
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Request-scoped chain root resolver.
///
/// Holds the day's records, any parents fetched on demand, and the root
/// cache. Drop it at the end of the request.
pub struct RootResolver<'a, S: RevisionStore> {
    store: &'a S,
    arena: RevisionArena,
    /// Resolved root per arena index.
    roots: Vec<Option<usize>>,
    /// Ids the store reported as absent.
    missing: HashSet<RevisionId>,
    max_depth: usize,
}

impl<'a, S: RevisionStore> RootResolver<'a, S> {
    /// Create a resolver over the locally fetched records.
    pub fn new(store: &'a S, records: impl IntoIterator<Item = RevisionRecord>) -> Self {
        let arena = RevisionArena::from_records(records);
        let roots = vec![None; arena.len()];
        Self {
            store,
            arena,
            roots,
            missing: HashSet::new(),
            max_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }

    /// Override the chain-walk cap (minimum 1).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Resolve the root of the chain containing `id`.
    ///
    /// Always returns some id: an id that cannot be found at all is its own
    /// root. Fails only if the store fails.
    pub async fn resolve_root(&mut self, id: RevisionId) -> Result<RevisionId, ResolveError> {
        let Some(start) = self.locate(id).await? else {
            debug!(revision_id = %id, "Revision not found, treating it as its own root");
            return Ok(id);
        };

        let mut path: Vec<usize> = Vec::new();
        let mut on_path: HashSet<usize> = HashSet::new();
        let mut current = start;

        let root = loop {
            if let Some(root) = self.roots[current] {
                break root;
            }
            path.push(current);
            on_path.insert(current);

            let Some(parent_id) = self.arena.record(current).parent_id else {
                break current;
            };

            if path.len() >= self.max_depth {
                warn!(
                    revision_id = %id,
                    max_depth = self.max_depth,
                    "Revision chain exceeds depth cap, truncating"
                );
                break current;
            }

            match self.locate(parent_id).await? {
                None => {
                    debug!(
                        revision_id = %self.arena.record(current).id,
                        parent_id = %parent_id,
                        "Parent revision missing, chain degrades to last found revision"
                    );
                    break current;
                }
                Some(parent) if on_path.contains(&parent) => {
                    warn!(
                        revision_id = %self.arena.record(current).id,
                        parent_id = %parent_id,
                        "Cycle in revision chain, stopping at last found revision"
                    );
                    break current;
                }
                Some(parent) => current = parent,
            }
        };

        for idx in path {
            self.roots[idx] = Some(root);
        }

        Ok(self.arena.record(root).id)
    }

    /// Cached root of `id`, if it has been resolved.
    pub fn cached_root(&self, id: RevisionId) -> Option<RevisionId> {
        let idx = self.arena.index_of(id)?;
        self.roots[idx].map(|root| self.arena.record(root).id)
    }

    /// Records known to the resolver (local plus fetched parents).
    pub fn arena(&self) -> &RevisionArena {
        &self.arena
    }

    /// Find a record in the arena, falling back to the store.
    async fn locate(&mut self, id: RevisionId) -> Result<Option<usize>, ResolveError> {
        if let Some(idx) = self.arena.index_of(id) {
            return Ok(Some(idx));
        }
        if self.missing.contains(&id) {
            return Ok(None);
        }

        trace!(revision_id = %id, "Revision not in local index, fetching from store");
        let fetched = self
            .store
            .fetch_record_by_id(id)
            .await
            .map_err(ResolveError::from_store)?;

        match fetched {
            Some(record) if record.id == id => {
                let idx = self.arena.push(record);
                self.roots.resize(self.arena.len(), None);
                Ok(Some(idx))
            }
            _ => {
                self.missing.insert(id);
                Ok(None)
            }
        }
    }
}

//! Revision history assembly.
//!
//! Turns a day's flat revision records into ordered [`RevisionGroup`]s:
//!
//! 1. Bucket records by resolved chain root
//! 2. Sort each chain by confirmation time (unconfirmed last), then id
//! 3. The last member of the sorted chain is its latest revision
//! 4. Order groups by the latest revision's confirmation time, newest
//!    first and unconfirmed last, then by root id

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::resolver::{ResolveError, RootResolver, DEFAULT_MAX_CHAIN_DEPTH};
use crate::store::RevisionStore;
use crate::types::{
    ChartId, RevisionEntry, RevisionGroup, RevisionHistory, RevisionId, RevisionRecord,
};

/// Compare optional confirmation times, treating `None` as the greatest.
pub fn confirmed_nulls_last(a: Option<&DateTime<Utc>>, b: Option<&DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order of revisions inside a chain: confirmation ascending with
/// unconfirmed revisions last, ties by id ascending.
pub fn chain_order(a: &RevisionRecord, b: &RevisionRecord) -> Ordering {
    confirmed_nulls_last(a.confirmed_at.as_ref(), b.confirmed_at.as_ref()).then_with(|| a.id.cmp(&b.id))
}

/// Confirmation descending with unconfirmed last.
fn newest_first(a: Option<&DateTime<Utc>>, b: Option<&DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Revisions sharing one resolved root, in chain order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionChain {
    /// Resolved root.
    pub root: RevisionId,
    /// Members sorted by [`chain_order`].
    pub records: Vec<RevisionRecord>,
}

impl RevisionChain {
    /// Build a chain, sorting its members.
    pub fn new(root: RevisionId, mut records: Vec<RevisionRecord>) -> Self {
        records.sort_by(chain_order);
        Self { root, records }
    }

    /// Latest member: the maximum under [`chain_order`].
    pub fn latest(&self) -> Option<&RevisionRecord> {
        self.records.last()
    }

    /// Project into a response group.
    pub fn to_group(&self, chart_id: ChartId, day: NaiveDate) -> Option<RevisionGroup> {
        let latest = self.latest()?;
        Some(RevisionGroup {
            root_revision_id: self.root,
            latest_revision_id: latest.id,
            karte_id: chart_id,
            visit_date: day.to_string(),
            items: self
                .records
                .iter()
                .map(|record| RevisionEntry::from_record(record, self.root))
                .collect(),
        })
    }
}

/// Order chains for presentation: latest confirmation newest first,
/// unconfirmed last, ties by root id.
pub fn order_chains(chains: &mut [RevisionChain]) {
    chains.sort_by(|a, b| {
        let a_key = a.latest().and_then(|r| r.confirmed_at.as_ref());
        let b_key = b.latest().and_then(|r| r.confirmed_at.as_ref());
        newest_first(a_key, b_key).then_with(|| a.root.cmp(&b.root))
    });
}

/// Assembles a day's revision history for one chart.
pub struct HistoryAssembler<'a, S: RevisionStore> {
    store: &'a S,
    max_chain_depth: usize,
}

impl<'a, S: RevisionStore> HistoryAssembler<'a, S> {
    /// Create an assembler that falls back to `store` for parents outside the day.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }

    /// Override the chain-walk cap.
    pub fn with_max_chain_depth(mut self, max_chain_depth: usize) -> Self {
        self.max_chain_depth = max_chain_depth;
        self
    }

    /// Bucket records into chains by resolved root.
    ///
    /// Every input record lands in exactly one chain. Chains come back in
    /// root id order; call [`order_chains`] for presentation order.
    pub async fn build_chains(
        &self,
        records: Vec<RevisionRecord>,
    ) -> Result<Vec<RevisionChain>, ResolveError> {
        let mut resolver = RootResolver::new(self.store, records.iter().cloned())
            .with_max_depth(self.max_chain_depth);

        let mut buckets: BTreeMap<RevisionId, Vec<RevisionRecord>> = BTreeMap::new();
        for record in records {
            let root = resolver.resolve_root(record.id).await?;
            buckets.entry(root).or_default().push(record);
        }

        Ok(buckets
            .into_iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(root, records)| RevisionChain::new(root, records))
            .collect())
    }

    /// Assemble the ordered history for `chart_id` on `day`.
    pub async fn assemble(
        &self,
        chart_id: ChartId,
        day: NaiveDate,
        records: Vec<RevisionRecord>,
    ) -> Result<RevisionHistory, ResolveError> {
        let num_records = records.len();
        let mut chains = self.build_chains(records).await?;
        order_chains(&mut chains);

        let groups: Vec<RevisionGroup> = chains
            .iter()
            .filter_map(|chain| chain.to_group(chart_id, day))
            .collect();

        debug!(
            chart_id = %chart_id,
            day = %day,
            num_records = num_records,
            num_groups = groups.len(),
            "Assembled revision history"
        );

        Ok(RevisionHistory {
            karte_id: chart_id,
            visit_date: day.to_string(),
            groups,
        })
    }
}

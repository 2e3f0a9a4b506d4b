//! Property tests for grouping, ordering and diffing.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use karte_revisions::{
    changed_entities, chain_order, fingerprint, ChartId, HistoryAssembler, InMemoryRevisionStore,
    ModuleEntity, RevisionHistory, RevisionRecord, Snapshot,
};
use proptest::prelude::*;

const CHART: ChartId = ChartId::new(42);

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// `(parent offset, confirmation minute)` per record; ids are 1..=n.
fn arb_records() -> impl Strategy<Value = Vec<RevisionRecord>> {
    prop::collection::vec((0i64..8, prop::option::of(0i64..600)), 0..40).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (parent_offset, minute))| {
                let id = i as i64 + 1;
                // Offsets may point forward, at self, or past the end
                let parent = if parent_offset == 0 { 0 } else { id - 4 + parent_offset };
                RevisionRecord::new(
                    id,
                    parent,
                    CHART,
                    base(),
                    minute.map(|m| base() + Duration::minutes(m)),
                )
            })
            .collect()
    })
}

fn arb_modules() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-d]", "[a-z]{0,6}"), 0..8)
}

fn snapshot(id: i64, modules: &[(String, String)]) -> Snapshot {
    modules.iter().enumerate().fold(
        Snapshot::new(RevisionRecord::new(id, 0, CHART, base(), Some(base()))),
        |snap, (i, (entity, payload))| snap.with_module(ModuleEntity::json(i as i64, entity.clone(), payload.clone())),
    )
}

fn assemble(records: Vec<RevisionRecord>) -> RevisionHistory {
    let store = InMemoryRevisionStore::new();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime
        .block_on(HistoryAssembler::new(&store).assemble(CHART, day(), records))
        .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// PROPERTIES
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn groups_partition_the_input(records in arb_records()) {
        let expected: BTreeSet<i64> = records.iter().map(|r| r.id.get()).collect();
        let history = assemble(records);

        let mut seen = BTreeSet::new();
        for group in &history.groups {
            prop_assert!(!group.items.is_empty());
            for item in &group.items {
                prop_assert!(seen.insert(item.revision_id.get()));
                prop_assert_eq!(item.root_revision_id, group.root_revision_id);
            }
        }
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn chains_are_sorted_and_latest_is_last(records in arb_records()) {
        let by_id: std::collections::HashMap<i64, RevisionRecord> =
            records.iter().map(|r| (r.id.get(), r.clone())).collect();
        let history = assemble(records);

        for group in &history.groups {
            let members: Vec<&RevisionRecord> =
                group.items.iter().map(|i| &by_id[&i.revision_id.get()]).collect();
            for pair in members.windows(2) {
                prop_assert_ne!(chain_order(pair[0], pair[1]), std::cmp::Ordering::Greater);
            }
            prop_assert_eq!(Some(group.latest_revision_id), group.items.last().map(|i| i.revision_id));
        }
    }

    #[test]
    fn assembly_is_deterministic(records in arb_records()) {
        let first = assemble(records.clone());
        let second = assemble(records);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn fingerprints_are_deterministic(modules in arb_modules()) {
        let snap = snapshot(1, &modules);
        prop_assert_eq!(fingerprint(&snap), fingerprint(&snapshot(1, &modules)));
    }

    #[test]
    fn self_diff_is_empty(modules in arb_modules()) {
        let prints = fingerprint(&snapshot(1, &modules));
        prop_assert!(changed_entities(&prints, &prints).is_empty());
    }

    #[test]
    fn changed_sets_are_symmetric(a in arb_modules(), b in arb_modules()) {
        let from = fingerprint(&snapshot(1, &a));
        let to = fingerprint(&snapshot(2, &b));

        let forward: BTreeSet<String> = changed_entities(&from, &to).into_iter().collect();
        let backward: BTreeSet<String> = changed_entities(&to, &from).into_iter().collect();
        prop_assert_eq!(forward, backward);
    }
}

//! Performance benchmarks for history assembly and fingerprinting.
//!
//! Run with: `cargo bench --bench history`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Assemble 1k records | <5ms | Single long chain, all parents local |
//! | Fingerprint 200 modules | <1ms | Textual payloads |

use criterion::{
    black_box, criterion_group, criterion_main,
    BenchmarkId, Criterion, Throughput,
};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use karte_revisions::{
    fingerprint, ChartId, HistoryAssembler, InMemoryRevisionStore, ModuleEntity, RevisionRecord,
    Snapshot,
};

const CHART: ChartId = ChartId::new(42);

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

/// `chains` chains of `len` revisions each, interleaved by id.
fn make_records(chains: i64, len: i64) -> Vec<RevisionRecord> {
    (0..chains * len)
        .map(|i| {
            let id = i + 1;
            let parent = if i < chains { 0 } else { id - chains };
            RevisionRecord::new(id, parent, CHART, base(), Some(base() + Duration::seconds(i)))
        })
        .collect()
}

fn bench_assemble(c: &mut Criterion) {
    let store = InMemoryRevisionStore::new();
    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("assemble");

    for (chains, len) in [(1, 1000), (100, 10), (1000, 1)] {
        let records = make_records(chains, len);
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("chains", format!("{}x{}", chains, len)),
            &records,
            |b, records| {
                b.iter(|| {
                    let history = runtime
                        .block_on(HistoryAssembler::new(&store).assemble(CHART, day, records.clone()))
                        .unwrap();
                    black_box(history)
                })
            },
        );
    }

    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for modules in [10usize, 200] {
        let snapshot = (0..modules).fold(
            Snapshot::new(RevisionRecord::new(1, 0, CHART, base(), Some(base()))),
            |snap, i| {
                snap.with_module(ModuleEntity::json(
                    i as i64,
                    format!("entity{}", i % 12),
                    "{\"text\":\"".repeat(8) + &"x".repeat(256),
                ))
            },
        );

        group.throughput(Throughput::Elements(modules as u64));
        group.bench_with_input(BenchmarkId::new("modules", modules), &snapshot, |b, snapshot| {
            b.iter(|| black_box(fingerprint(snapshot)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_assemble, bench_fingerprint);
criterion_main!(benches);

mod common;

use chrono::NaiveDate;
use collision_processor::{
    CollisionDataset, ColumnStore, EngineConfig, RecordStore, RowStore, SearchPredicate,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

const ROWS: usize = 200_000;

fn predicates() -> Vec<(&'static str, SearchPredicate)> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
    vec![
        ("date_range", SearchPredicate::date_range(start, end)),
        ("borough", SearchPredicate::Borough("BRONX".into())),
        ("postal_code", SearchPredicate::PostalCode(10_042)),
        ("injury_threshold", SearchPredicate::InjuryThreshold(5)),
        ("bounds", SearchPredicate::bounds(40.6, 40.8, -74.0, -73.8)),
    ]
}

fn bench_layout<S: RecordStore>(c: &mut Criterion, path: &std::path::Path) {
    let layout = S::LAYOUT.name();
    let mut group = c.benchmark_group(format!("{layout}_store"));
    group.sample_size(10);
    group.throughput(Throughput::Elements(ROWS as u64));

    for (mode, config) in [
        ("sequential", EngineConfig::sequential()),
        ("parallel", EngineConfig::default()),
    ] {
        group.bench_function(BenchmarkId::new("load", mode), |b| {
            b.iter(|| {
                let mut dataset = CollisionDataset::<S>::with_config(config.clone()).unwrap();
                dataset.load(path).unwrap();
                black_box(dataset.len())
            })
        });

        let mut dataset = CollisionDataset::<S>::with_config(config).unwrap();
        dataset.load(path).unwrap();

        for (name, predicate) in predicates() {
            group.bench_function(BenchmarkId::new(name, mode), |b| {
                b.iter(|| black_box(dataset.search_indices(black_box(&predicate)).len()))
            });
        }

        group.bench_function(BenchmarkId::new("search_and_materialize", mode), |b| {
            b.iter(|| black_box(dataset.search_by_borough("QUEENS").len()))
        });
    }

    group.finish();
}

fn bench_searches(c: &mut Criterion) {
    let file = common::collisions_file(ROWS);
    bench_layout::<RowStore>(c, file.path());
    bench_layout::<ColumnStore>(c, file.path());
}

criterion_group!(benches, bench_searches);
criterion_main!(benches);

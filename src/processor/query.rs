use chrono::NaiveDate;
use parking_lot::Mutex;
use rayon::{
    ThreadPool,
    iter::{IntoParallelIterator, ParallelIterator},
};
use std::time::Instant;
use tracing::debug;

use crate::processor::{
    MergeOrder, SearchPredicate, coercion::local_midnight_timestamp, config::EngineConfig,
    record::CollisionRecord, store::RecordStore,
};

impl SearchPredicate {
    /// Inclusive range over whole local days.
    pub fn date_range(start: NaiveDate, end: NaiveDate) -> Self {
        SearchPredicate::DateRange {
            start: local_midnight_timestamp(start),
            end: local_midnight_timestamp(end),
        }
    }

    pub fn bounds(min_lat: f64, max_lat: f64, min_long: f64, max_long: f64) -> Self {
        SearchPredicate::Bounds {
            min_lat,
            max_lat,
            min_long,
            max_long,
        }
    }

    /// Per-record test. Pure, so scans can evaluate records in any order.
    pub fn matches(&self, record: &CollisionRecord) -> bool {
        match self {
            SearchPredicate::DateRange { start, end } => {
                record.crash_date >= *start && record.crash_date <= *end
            }
            SearchPredicate::Borough(borough) => record.borough == *borough,
            SearchPredicate::PostalCode(code) => record.postal_code == *code,
            SearchPredicate::InjuryThreshold(min) => record.total_injured() >= u64::from(*min),
            SearchPredicate::Bounds {
                min_lat,
                max_lat,
                min_long,
                max_long,
            } => {
                record.latitude >= *min_lat
                    && record.latitude <= *max_lat
                    && record.longitude >= *min_long
                    && record.longitude <= *max_long
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SearchPredicate::DateRange { .. } => "date_range",
            SearchPredicate::Borough(_) => "borough",
            SearchPredicate::PostalCode(_) => "postal_code",
            SearchPredicate::InjuryThreshold(_) => "injury_threshold",
            SearchPredicate::Bounds { .. } => "bounds",
        }
    }
}

/// Runs `predicate` over the whole store and returns matching indices.
///
/// Without a pool the scan is a single ascending pass. With a pool the scan is
/// parallel and its order follows `config.merge_order()`.
pub(crate) fn scan_indices<S: RecordStore>(
    store: &S,
    predicate: &SearchPredicate,
    config: &EngineConfig,
    pool: Option<&ThreadPool>,
) -> Vec<usize> {
    let started = Instant::now();
    let matches = match pool {
        Some(pool) => pool.install(|| {
            scan_parallel(store, predicate, config.scan_chunk_size(), config.merge_order())
        }),
        None => scan_sequential(store, predicate),
    };
    debug!(
        predicate = predicate.label(),
        layout = S::LAYOUT.name(),
        workers = config.workers(),
        matches = matches.len(),
        elapsed = ?started.elapsed(),
        "scan finished"
    );
    matches
}

/// Single pass in index order.
pub fn scan_sequential<S: RecordStore>(store: &S, predicate: &SearchPredicate) -> Vec<usize> {
    let mut out = Vec::new();
    store.scan(predicate, 0..store.len(), &mut out);
    out
}

/// Fork-join scan on the current rayon pool.
///
/// The index range is cut into `chunk_size` pieces that workers pick up
/// dynamically. Each worker collects matches into a private buffer, and each
/// buffer is appended to the result under one lock. The result set always
/// equals [`scan_sequential`]'s; the order only does with [`MergeOrder::Source`].
pub fn scan_parallel<S: RecordStore>(
    store: &S,
    predicate: &SearchPredicate,
    chunk_size: usize,
    merge_order: MergeOrder,
) -> Vec<usize> {
    let len = store.len();
    let chunk_size = chunk_size.max(1);
    let merged = Mutex::new(Vec::new());

    (0..len.div_ceil(chunk_size))
        .into_par_iter()
        .fold(Vec::new, |mut local, chunk| {
            let start = chunk * chunk_size;
            let end = (start + chunk_size).min(len);
            store.scan(predicate, start..end, &mut local);
            local
        })
        .for_each(|local| {
            if !local.is_empty() {
                merged.lock().extend(local);
            }
        });

    let mut result = merged.into_inner();
    if merge_order == MergeOrder::Source {
        result.sort_unstable();
    }
    result
}

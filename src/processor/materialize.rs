use rayon::{
    ThreadPool,
    iter::{IntoParallelRefIterator, ParallelIterator},
};

use crate::processor::{record::CollisionRecord, store::RecordStore};

/// Rebuilds whole records for `indices`, keeping their order.
///
/// For the column layout this gathers index `i` from every field array. Out of
/// range indices are skipped. With a pool the gather runs in parallel; the
/// output order is still that of `indices`.
pub fn materialize<S: RecordStore>(
    store: &S,
    indices: &[usize],
    pool: Option<&ThreadPool>,
) -> Vec<CollisionRecord> {
    match pool {
        Some(pool) => pool.install(|| {
            indices
                .par_iter()
                .filter_map(|&idx| store.record(idx))
                .collect()
        }),
        None => indices.iter().filter_map(|&idx| store.record(idx)).collect(),
    }
}

/// Every record in store order.
pub fn materialize_all<S: RecordStore>(
    store: &S,
    pool: Option<&ThreadPool>,
) -> Vec<CollisionRecord> {
    let indices: Vec<usize> = (0..store.len()).collect();
    materialize(store, &indices, pool)
}

#[cfg(test)]
mod tests {
    use rayon::ThreadPoolBuilder;

    use super::*;
    use crate::processor::{column::ColumnStore, store::RowStore};

    fn filled<S: RecordStore>(n: i64) -> S {
        let mut store = S::default();
        for id in 0..n {
            store.push(CollisionRecord {
                collision_id: id,
                crash_time: format!("{id}:00"),
                ..Default::default()
            });
        }
        store
    }

    #[test]
    fn test_keeps_index_order() {
        let store: ColumnStore = filled(10);
        let records = materialize(&store, &[7, 2, 9], None);
        let ids: Vec<i64> = records.iter().map(|r| r.collision_id).collect();
        assert_eq!(ids, vec![7, 2, 9]);
        assert_eq!(records[0].crash_time, "7:00");
    }

    #[test]
    fn test_skips_out_of_range() {
        let store: RowStore = filled(3);
        assert_eq!(materialize(&store, &[0, 3, 2], None).len(), 2);
    }

    #[test]
    fn test_parallel_gather_matches_sequential() {
        let store: ColumnStore = filled(1_000);
        let pool = ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        assert_eq!(
            materialize_all(&store, Some(&pool)),
            materialize_all(&store, None)
        );
    }
}

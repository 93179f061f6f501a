use std::ops::Range;

use crate::processor::{SearchPredicate, record::CollisionRecord};

/// Physical layout of a [`RecordStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One struct per record.
    Row,
    /// One contiguous array per field ("structure of arrays").
    Column,
}

impl Layout {
    pub fn name(&self) -> &'static str {
        match self {
            Layout::Row => "row",
            Layout::Column => "column",
        }
    }
}

/// Storage interface shared by the row and column layouts.
///
/// A store is filled once during ingestion (through [`push`](Self::push) and
/// [`append`](Self::append)) and is read-only afterwards. Worker threads
/// accumulate into private stores of the same layout, which are then appended
/// to the shared one.
pub trait RecordStore: Default + Send + Sync + Sized {
    const LAYOUT: Layout;

    fn with_capacity(capacity: usize) -> Self;

    fn reserve(&mut self, additional: usize);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, record: CollisionRecord);

    /// Moves every record of `other` to the end of `self`.
    ///
    /// Capacity already reserved in `self` is used when it can hold `other`.
    fn append(&mut self, other: Self);

    /// Fully materialized record at `idx`.
    fn record(&self, idx: usize) -> Option<CollisionRecord>;

    /// Evaluates `predicate` against the record at `idx`.
    fn matches(&self, idx: usize, predicate: &SearchPredicate) -> bool;

    /// Pushes the indices in `range` whose record satisfies `predicate`, in
    /// ascending order.
    fn scan(&self, predicate: &SearchPredicate, range: Range<usize>, out: &mut Vec<usize>) {
        out.extend(range.filter(|&idx| self.matches(idx, predicate)));
    }
}

/// Row layout: an ordered `Vec` of records.
#[derive(Debug, Default, Clone)]
pub struct RowStore {
    records: Vec<CollisionRecord>,
}

impl RowStore {
    pub fn records(&self) -> &[CollisionRecord] {
        &self.records
    }

    pub fn get(&self, idx: usize) -> Option<&CollisionRecord> {
        self.records.get(idx)
    }
}

impl RecordStore for RowStore {
    const LAYOUT: Layout = Layout::Row;

    fn with_capacity(capacity: usize) -> Self {
        RowStore {
            records: Vec::with_capacity(capacity),
        }
    }

    fn reserve(&mut self, additional: usize) {
        self.records.reserve(additional);
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn push(&mut self, record: CollisionRecord) {
        self.records.push(record);
    }

    fn append(&mut self, mut other: Self) {
        // take over other's buffer unless ours was reserved large enough
        if self.records.is_empty() && self.records.capacity() < other.records.len() {
            self.records = other.records;
        } else {
            self.records.append(&mut other.records);
        }
    }

    fn record(&self, idx: usize) -> Option<CollisionRecord> {
        self.records.get(idx).cloned()
    }

    fn matches(&self, idx: usize, predicate: &SearchPredicate) -> bool {
        predicate.matches(&self.records[idx])
    }

    fn scan(&self, predicate: &SearchPredicate, range: Range<usize>, out: &mut Vec<usize>) {
        let start = range.start;
        out.extend(
            self.records[range]
                .iter()
                .enumerate()
                .filter(|(_, record)| predicate.matches(record))
                .map(|(offset, _)| start + offset),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, borough: &str) -> CollisionRecord {
        CollisionRecord {
            collision_id: id,
            borough: borough.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_push_and_append_keep_order() {
        let mut store = RowStore::with_capacity(4);
        store.push(record(1, "BRONX"));

        let mut other = RowStore::default();
        other.push(record(2, "QUEENS"));
        other.push(record(3, "BRONX"));
        store.append(other);

        assert_eq!(store.len(), 3);
        let ids: Vec<i64> = store.records().iter().map(|r| r.collision_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.record(1).unwrap().borough, "QUEENS");
        assert!(store.record(3).is_none());
    }

    #[test]
    fn test_append_fills_reserved_store() {
        let mut store = RowStore::with_capacity(64);
        let mut part = RowStore::default();
        part.push(record(1, "BRONX"));
        part.push(record(2, "QUEENS"));
        store.append(part);

        assert_eq!(store.len(), 2);
        assert!(store.records.capacity() >= 64);

        let mut empty = RowStore::default();
        let mut big = RowStore::default();
        for id in 0..10 {
            big.push(record(id, "BRONX"));
        }
        empty.append(big);
        assert_eq!(empty.len(), 10);
    }

    #[test]
    fn test_scan_reports_absolute_indices() {
        let mut store = RowStore::default();
        for (id, borough) in [(1, "BRONX"), (2, "QUEENS"), (3, "BRONX"), (4, "BRONX")] {
            store.push(record(id, borough));
        }

        let mut out = Vec::new();
        store.scan(&SearchPredicate::Borough("BRONX".into()), 1..4, &mut out);
        assert_eq!(out, vec![2, 3]);
    }
}

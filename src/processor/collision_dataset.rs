use chrono::NaiveDate;
use rayon::ThreadPool;
use std::path::Path;

use crate::processor::{
    ParseSummary, ProcessorError, SearchPredicate,
    coercion::parse_naive_date,
    column::ColumnStore,
    config::EngineConfig,
    ingest::load_store,
    materialize::{materialize, materialize_all},
    query::scan_indices,
    record::CollisionRecord,
    store::{Layout, RecordStore, RowStore},
};

/// Collision dataset held in the row layout.
pub type RowDataset = CollisionDataset<RowStore>;

/// Collision dataset held in the column layout.
pub type ColumnDataset = CollisionDataset<ColumnStore>;

/// A loaded collision corpus plus the settings used to load and scan it.
///
/// The storage layout is fixed by the type parameter. The dataset is loaded
/// once and then only read, so any number of searches may run concurrently
/// through `&self`.
///
/// # Examples
///
/// ```no_run
/// use collision_processor::{ColumnDataset, EngineConfig};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = EngineConfig::builder().with_workers(4).build()?;
///     let mut dataset = ColumnDataset::with_config(config)?;
///     let summary = dataset.load("Motor_Vehicle_Collisions.csv")?;
///     println!("loaded {} rows", summary.rows_processed);
///
///     let brooklyn = dataset.search_by_borough("BROOKLYN");
///     let serious = dataset.search_by_injury_threshold(5);
///     println!("{} in Brooklyn, {} with 5+ injured", brooklyn.len(), serious.len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct CollisionDataset<S: RecordStore> {
    store: S,
    config: EngineConfig,
    pool: Option<ThreadPool>,
    loaded: bool,
}

impl<S: RecordStore> CollisionDataset<S> {
    /// Empty dataset using every available core.
    pub fn new() -> Result<Self, ProcessorError> {
        Self::with_config(EngineConfig::default())
    }

    /// Empty dataset that loads and scans on the calling thread only.
    pub fn sequential() -> Self {
        CollisionDataset {
            store: S::default(),
            config: EngineConfig::sequential(),
            pool: None,
            loaded: false,
        }
    }

    /// Empty dataset with its own worker pool of `config.workers()` threads.
    pub fn with_config(config: EngineConfig) -> Result<Self, ProcessorError> {
        let pool = config.build_pool()?;
        Ok(CollisionDataset {
            store: S::default(),
            config,
            pool,
            loaded: false,
        })
    }

    /// Loads a collision file, discarding its header line.
    ///
    /// Malformed lines and unparseable fields do not fail the load; they are
    /// listed in the returned [`ParseSummary`].
    ///
    /// # Errors
    /// - [`ProcessorError::SourceUnreadable`] if the file cannot be opened
    /// - [`ProcessorError::EmptySource`] if it has no header or no data lines
    /// - [`ProcessorError::AlreadyLoaded`] on a second call
    ///
    /// On error the dataset stays empty.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<ParseSummary, ProcessorError> {
        if self.loaded {
            return Err(ProcessorError::AlreadyLoaded);
        }
        let (store, summary) = load_store::<S>(path.as_ref(), &self.config, self.pool.as_ref())?;
        self.store = store;
        self.loaded = true;
        Ok(summary)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn layout(&self) -> Layout {
        S::LAYOUT
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying store, e.g. for direct column access.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn record(&self, idx: usize) -> Option<CollisionRecord> {
        self.store.record(idx)
    }

    /// Every record, in store order.
    pub fn records(&self) -> Vec<CollisionRecord> {
        materialize_all(&self.store, self.pool.as_ref())
    }

    /// Indices of the records matching `predicate`.
    pub fn search_indices(&self, predicate: &SearchPredicate) -> Vec<usize> {
        scan_indices(&self.store, predicate, &self.config, self.pool.as_ref())
    }

    /// Records at `indices`, in the given order.
    pub fn materialize(&self, indices: &[usize]) -> Vec<CollisionRecord> {
        materialize(&self.store, indices, self.pool.as_ref())
    }

    pub fn search(&self, predicate: &SearchPredicate) -> Vec<CollisionRecord> {
        let indices = self.search_indices(predicate);
        self.materialize(&indices)
    }

    /// Collisions dated between `start` and `end`, both days included.
    pub fn search_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<CollisionRecord> {
        self.search(&SearchPredicate::date_range(start, end))
    }

    /// [`search_by_date_range`](Self::search_by_date_range) with `MM/DD/YYYY` bounds.
    pub fn search_by_date_range_str(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<CollisionRecord>, ProcessorError> {
        let start = parse_naive_date(start)?;
        let end = parse_naive_date(end)?;
        Ok(self.search_by_date_range(start, end))
    }

    /// Exact, case-sensitive borough match.
    pub fn search_by_borough(&self, borough: &str) -> Vec<CollisionRecord> {
        self.search(&SearchPredicate::Borough(borough.to_string()))
    }

    pub fn search_by_postal_code(&self, postal_code: i32) -> Vec<CollisionRecord> {
        self.search(&SearchPredicate::PostalCode(postal_code))
    }

    /// Collisions where persons, pedestrians, cyclists and motorists injured add
    /// up to at least `min_injuries`.
    pub fn search_by_injury_threshold(&self, min_injuries: u32) -> Vec<CollisionRecord> {
        self.search(&SearchPredicate::InjuryThreshold(min_injuries))
    }

    /// Collisions inside the latitude/longitude rectangle, edges included.
    pub fn search_by_bounds(
        &self,
        min_lat: f64,
        max_lat: f64,
        min_long: f64,
        max_long: f64,
    ) -> Vec<CollisionRecord> {
        self.search(&SearchPredicate::bounds(min_lat, max_lat, min_long, max_long))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{
        MergeOrder,
        test_support::{Row, varied_lines, write_source},
    };

    #[test]
    fn test_load_twice_is_rejected() {
        let tmp = write_source(&varied_lines(3));
        let mut dataset = RowDataset::sequential();
        dataset.load(tmp.path()).unwrap();
        assert!(matches!(
            dataset.load(tmp.path()),
            Err(ProcessorError::AlreadyLoaded)
        ));
        assert_eq!(dataset.len(), 3);
    }

    #[test]
    fn test_failed_load_leaves_dataset_empty() {
        let mut dataset = ColumnDataset::sequential();
        assert!(dataset.load("/no/such/file.csv").is_err());
        assert!(!dataset.is_loaded());
        assert!(dataset.is_empty());
        assert!(dataset.search_by_injury_threshold(0).is_empty());
    }

    #[test]
    fn test_date_range_search() {
        let lines = vec![
            Row { id: 1, date: "06/15/2020", ..Row::default() }.line(),
            Row { id: 2, date: "01/01/2019", ..Row::default() }.line(),
            Row { id: 3, date: "12/31/2020", ..Row::default() }.line(),
        ];
        let tmp = write_source(&lines);
        let mut dataset = ColumnDataset::sequential();
        dataset.load(tmp.path()).unwrap();

        let hits = dataset
            .search_by_date_range_str("01/01/2020", "12/31/2020")
            .unwrap();
        let ids: Vec<i64> = hits.iter().map(|r| r.collision_id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert!(dataset.search_by_date_range_str("2020-01-01", "12/31/2020").is_err());
    }

    #[test]
    fn test_postal_code_and_bounds() {
        let lines = vec![
            Row { id: 1, zip: "11201", lat: "40.9", lon: "-73.7", ..Row::default() }.line(),
            Row { id: 2, zip: "", lat: "", lon: "", ..Row::default() }.line(),
            Row { id: 3, zip: "11201", lat: "40.91", lon: "-73.7", ..Row::default() }.line(),
        ];
        let tmp = write_source(&lines);
        let mut dataset = RowDataset::sequential();
        dataset.load(tmp.path()).unwrap();

        let by_zip: Vec<i64> = dataset
            .search_by_postal_code(11201)
            .iter()
            .map(|r| r.collision_id)
            .collect();
        assert_eq!(by_zip, vec![1, 3]);

        // missing postal code and coordinates default to zero
        assert_eq!(dataset.search_by_postal_code(0)[0].collision_id, 2);

        let in_box: Vec<i64> = dataset
            .search_by_bounds(40.5, 40.9, -74.0, -73.7)
            .iter()
            .map(|r| r.collision_id)
            .collect();
        assert_eq!(in_box, vec![1]);
    }

    #[test]
    fn test_parallel_dataset_matches_sequential() {
        let tmp = write_source(&varied_lines(3_000));
        let config = EngineConfig::builder()
            .with_workers(4)
            .with_scan_chunk_size(100)
            .with_merge_order(MergeOrder::Source)
            .build()
            .unwrap();

        let mut parallel = ColumnDataset::with_config(config).unwrap();
        parallel.load(tmp.path()).unwrap();
        let mut sequential = RowDataset::sequential();
        sequential.load(tmp.path()).unwrap();

        assert_eq!(parallel.records(), sequential.records());
        assert_eq!(
            parallel.search_by_borough("QUEENS"),
            sequential.search_by_borough("QUEENS")
        );
        assert_eq!(
            parallel.search_by_injury_threshold(4),
            sequential.search_by_injury_threshold(4)
        );
    }
}

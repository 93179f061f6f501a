//! # collision_processor
//!
//! In-memory store and scan engine for traffic-collision CSV exports
//! (the 29-column NYC motor vehicle collisions schema). It supports:
//!
//! - Memory-mapped loading with parallel, newline-aligned chunk parsing
//! - Two storage layouts behind one API: array of records ([`RowStore`]) and
//!   one array per field ([`ColumnStore`])
//! - Five searches: date range, borough, postal code, injury threshold and
//!   geographic bounds
//! - Sequential or fork-join parallel scans on a per-dataset Rayon pool
//! - AVX2 range filters for the column layout (scalar fallback elsewhere)
//!
//! Lines with too few fields are dropped and fields that fail to parse are
//! defaulted; both are reported in the [`ParseSummary`] returned by `load`.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use collision_processor::{ColumnDataset, EngineConfig, MergeOrder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::builder()
//!         .with_workers(8)
//!         .with_merge_order(MergeOrder::Source)
//!         .build()?;
//!     let mut dataset = ColumnDataset::with_config(config)?;
//!
//!     let summary = dataset.load("Motor_Vehicle_Collisions.csv")?;
//!     println!(
//!         "{} rows, {} dropped",
//!         summary.rows_processed, summary.lines_dropped
//!     );
//!
//!     let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//!     let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
//!     let in_2020 = dataset.search_by_date_range(start, end);
//!     let midtown = dataset.search_by_bounds(40.74, 40.77, -74.0, -73.97);
//!     println!("{} in 2020, {} in midtown", in_2020.len(), midtown.len());
//!
//!     Ok(())
//! }
//! ```

mod helpers;
pub mod processor;

pub use processor::{
    ConversionError, MergeOrder, ParseError, ParseErrorKind, ParseSummary, ProcessorError,
    SearchPredicate,
    collision_dataset::{CollisionDataset, ColumnDataset, RowDataset},
    column::ColumnStore,
    config::{EngineConfig, EngineConfigBuilder},
    record::CollisionRecord,
    store::{Layout, RecordStore, RowStore},
};

use std::path::PathBuf;
use thiserror::Error;

pub mod coercion;
pub mod collision_dataset;
pub mod column;
pub mod config;
pub mod ingest;
pub mod materialize;
pub mod query;
pub mod record;
pub mod store;
pub mod tokenizer;

#[cfg(test)]
pub(crate) mod test_support;

/// Error type used across the crate.
///
/// Only conditions that abort a whole operation are represented here.
/// Per-line and per-field problems found while loading are reported through
/// [`ParseSummary`] instead.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("cannot read source {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source {} has no header or no data rows", path.display())]
    EmptySource { path: PathBuf },

    #[error("dataset is already loaded")]
    AlreadyLoaded,

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Failure to coerce a single non-empty token into its typed field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("invalid integer {token:?}: {reason}")]
    Int { token: String, reason: String },

    #[error("invalid float {token:?}: {reason}")]
    Float { token: String, reason: String },

    #[error("invalid date {token:?}: {reason}")]
    Date { token: String, reason: String },
}

/// Outcome of a successful load.
#[derive(Debug, Default)]
pub struct ParseSummary {
    /// Records appended to the store.
    pub rows_processed: usize,
    /// Data lines dropped because they had too few fields.
    pub lines_dropped: usize,
    /// Every recoverable problem met during the load, in line order.
    pub errors: Vec<ParseError>,
}

impl ParseSummary {
    /// Folds a worker's partial summary into this one.
    pub fn absorb(&mut self, other: ParseSummary) {
        self.rows_processed += other.rows_processed;
        self.lines_dropped += other.lines_dropped;
        self.errors.extend(other.errors);
    }

    pub fn conversion_failures(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.kind == ParseErrorKind::FieldConversion)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Fewer tokens than the schema requires. The line was dropped.
    MalformedLine,
    /// A field token failed to parse. The record was kept with the field defaulted.
    FieldConversion,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    /// 1-based line number in the source, header included.
    pub line: usize,
    pub kind: ParseErrorKind,
    /// Column name, empty for whole-line problems.
    pub column: String,
    pub value: String,
    pub error: Option<String>,
}

/// Search predicates supported by the scan engine.
///
/// All bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPredicate {
    /// `start <= crash_date <= end`, on local-midnight Unix timestamps.
    DateRange { start: i64, end: i64 },
    /// Exact, case-sensitive borough match.
    Borough(String),
    PostalCode(i32),
    /// Sum of the four injured counters (killed counters excluded) `>= min`.
    InjuryThreshold(u32),
    Bounds {
        min_lat: f64,
        max_lat: f64,
        min_long: f64,
        max_long: f64,
    },
}

/// How results from parallel workers are ordered after the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeOrder {
    /// Worker buffers are appended as workers finish. Order is unspecified.
    #[default]
    Completion,
    /// Merged results are restored to source (index) order.
    Source,
}

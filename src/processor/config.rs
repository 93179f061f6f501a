use std::num::NonZeroUsize;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::processor::{MergeOrder, ProcessorError};

pub const DEFAULT_SCAN_CHUNK_SIZE: usize = 16_384;
pub const DEFAULT_INGEST_CHUNKS_PER_WORKER: usize = 4;
pub const DEFAULT_DELIMITER: char = ',';

/// Execution settings for one [`CollisionDataset`](super::collision_dataset::CollisionDataset).
///
/// `workers == 1` runs everything sequentially on the calling thread.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    workers: usize,
    scan_chunk_size: usize,
    ingest_chunks_per_worker: usize,
    merge_order: MergeOrder,
    delimiter: char,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Single-threaded configuration.
    pub fn sequential() -> Self {
        EngineConfig {
            workers: 1,
            ..EngineConfig::default()
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_parallel(&self) -> bool {
        self.workers > 1
    }

    pub fn scan_chunk_size(&self) -> usize {
        self.scan_chunk_size
    }

    pub fn ingest_chunks_per_worker(&self) -> usize {
        self.ingest_chunks_per_worker
    }

    pub fn merge_order(&self) -> MergeOrder {
        self.merge_order
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Builds the worker pool for this configuration, or `None` in sequential mode.
    pub(crate) fn build_pool(&self) -> Result<Option<ThreadPool>, ProcessorError> {
        if !self.is_parallel() {
            return Ok(None);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|idx| format!("collision-worker-{idx}"))
            .build()?;
        Ok(Some(pool))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            workers: default_workers(),
            scan_chunk_size: DEFAULT_SCAN_CHUNK_SIZE,
            ingest_chunks_per_worker: DEFAULT_INGEST_CHUNKS_PER_WORKER,
            merge_order: MergeOrder::default(),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: EngineConfig::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> EngineConfigBuilder {
        self.config.workers = workers;
        self
    }

    pub fn with_scan_chunk_size(mut self, scan_chunk_size: usize) -> EngineConfigBuilder {
        self.config.scan_chunk_size = scan_chunk_size;
        self
    }

    pub fn with_ingest_chunks_per_worker(mut self, chunks: usize) -> EngineConfigBuilder {
        self.config.ingest_chunks_per_worker = chunks;
        self
    }

    pub fn with_merge_order(mut self, merge_order: MergeOrder) -> EngineConfigBuilder {
        self.config.merge_order = merge_order;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> EngineConfigBuilder {
        self.config.delimiter = delimiter;
        self
    }

    pub fn build(self) -> Result<EngineConfig, ProcessorError> {
        let config = self.config;
        if config.workers == 0 {
            return Err(ProcessorError::InvalidConfig("workers must be at least 1".into()));
        }
        if config.scan_chunk_size == 0 {
            return Err(ProcessorError::InvalidConfig(
                "scan_chunk_size must be at least 1".into(),
            ));
        }
        if config.ingest_chunks_per_worker == 0 {
            return Err(ProcessorError::InvalidConfig(
                "ingest_chunks_per_worker must be at least 1".into(),
            ));
        }
        if matches!(config.delimiter, '"' | '\n' | '\r') {
            return Err(ProcessorError::InvalidConfig(format!(
                "{:?} cannot be used as a delimiter",
                config.delimiter
            )));
        }
        Ok(config)
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let config = EngineConfig::builder()
            .with_workers(3)
            .with_scan_chunk_size(128)
            .with_ingest_chunks_per_worker(2)
            .with_merge_order(MergeOrder::Source)
            .with_delimiter(';')
            .build()
            .unwrap();

        assert_eq!(config.workers(), 3);
        assert!(config.is_parallel());
        assert_eq!(config.scan_chunk_size(), 128);
        assert_eq!(config.ingest_chunks_per_worker(), 2);
        assert_eq!(config.merge_order(), MergeOrder::Source);
        assert_eq!(config.delimiter(), ';');
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(EngineConfig::builder().with_workers(0).build().is_err());
        assert!(EngineConfig::builder().with_scan_chunk_size(0).build().is_err());
        assert!(
            EngineConfig::builder()
                .with_ingest_chunks_per_worker(0)
                .build()
                .is_err()
        );
        assert!(EngineConfig::builder().with_delimiter('"').build().is_err());
    }

    #[test]
    fn test_sequential_has_no_pool() {
        let config = EngineConfig::sequential();
        assert!(!config.is_parallel());
        assert!(config.build_pool().unwrap().is_none());
    }

    #[test]
    fn test_parallel_pool_has_requested_threads() {
        let config = EngineConfig::builder().with_workers(2).build().unwrap();
        let pool = config.build_pool().unwrap().unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}

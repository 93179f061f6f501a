use std::{error::Error, path::PathBuf, time::Instant};

use clap::{Parser, ValueEnum};
use collision_processor::{
    CollisionDataset, ColumnStore, EngineConfig, MergeOrder, RecordStore, RowStore,
};
use tracing::info;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Completion,
    Source,
}

impl From<OrderArg> for MergeOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Completion => MergeOrder::Completion,
            OrderArg::Source => MergeOrder::Source,
        }
    }
}

/// Loads a collisions CSV and times the five searches sequentially and in parallel.
#[derive(Parser, Debug)]
#[command(name = "collision-processor", version, about, long_about = None)]
struct Cli {
    /// Collisions CSV with a header line
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Worker threads for the parallel run (defaults to all cores)
    #[arg(short, long)]
    workers: Option<usize>,

    #[arg(short, long, value_enum, default_value = "column")]
    layout: LayoutArg,

    #[arg(long, value_enum, default_value = "completion")]
    merge_order: OrderArg,

    /// First day of the date search, MM/DD/YYYY
    #[arg(long, default_value = "01/01/2020")]
    from: String,

    /// Last day of the date search, MM/DD/YYYY
    #[arg(long, default_value = "12/31/2020")]
    to: String,

    #[arg(long, default_value = "BROOKLYN")]
    borough: String,

    #[arg(long, default_value_t = 11208)]
    postal_code: i32,

    #[arg(long, default_value_t = 3)]
    min_injuries: u32,

    /// min_lat max_lat min_long max_long
    #[arg(
        long,
        num_args = 4,
        allow_negative_numbers = true,
        default_values_t = [40.70, 40.80, -74.02, -73.93]
    )]
    bounds: Vec<f64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .ok();

    let cli = Cli::parse();

    let mut builder = EngineConfig::builder().with_merge_order(cli.merge_order.into());
    if let Some(workers) = cli.workers {
        builder = builder.with_workers(workers);
    }
    let parallel = builder.build()?;

    match cli.layout {
        LayoutArg::Row => run::<RowStore>(&cli, parallel),
        LayoutArg::Column => run::<ColumnStore>(&cli, parallel),
    }
}

fn run<S: RecordStore>(cli: &Cli, parallel: EngineConfig) -> Result<(), Box<dyn Error>> {
    for config in [EngineConfig::sequential(), parallel] {
        let workers = config.workers();
        let mut dataset = CollisionDataset::<S>::with_config(config)?;

        let started = Instant::now();
        let summary = dataset.load(&cli.path)?;
        info!(
            layout = S::LAYOUT.name(),
            workers,
            rows = summary.rows_processed,
            dropped = summary.lines_dropped,
            conversion_failures = summary.conversion_failures(),
            elapsed = ?started.elapsed(),
            "load"
        );

        search(&dataset, workers, cli)?;
    }
    Ok(())
}

fn search<S: RecordStore>(
    dataset: &CollisionDataset<S>,
    workers: usize,
    cli: &Cli,
) -> Result<(), Box<dyn Error>> {
    let [min_lat, max_lat, min_long, max_long] = match cli.bounds.as_slice() {
        &[a, b, c, d] => [a, b, c, d],
        _ => return Err("--bounds takes exactly four values".into()),
    };

    let started = Instant::now();
    let hits = dataset.search_by_date_range_str(&cli.from, &cli.to)?.len();
    report("date_range", workers, hits, started);

    let started = Instant::now();
    let hits = dataset.search_by_borough(&cli.borough).len();
    report("borough", workers, hits, started);

    let started = Instant::now();
    let hits = dataset.search_by_postal_code(cli.postal_code).len();
    report("postal_code", workers, hits, started);

    let started = Instant::now();
    let hits = dataset.search_by_injury_threshold(cli.min_injuries).len();
    report("injury_threshold", workers, hits, started);

    let started = Instant::now();
    let hits = dataset
        .search_by_bounds(min_lat, max_lat, min_long, max_long)
        .len();
    report("bounds", workers, hits, started);

    Ok(())
}

fn report(name: &str, workers: usize, hits: usize, started: Instant) {
    println!(
        "{:<18} workers={:<3} matches={:<10} {:?}",
        name,
        workers,
        hits,
        started.elapsed()
    );
}

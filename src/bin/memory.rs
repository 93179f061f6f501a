use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use collision_processor::{CollisionDataset, ColumnStore, RecordStore, RowStore};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    Row,
    Column,
}

/// Heap profile of loading a collisions file and running one search.
///
/// Run once per layout and compare the `dhat-heap.json` totals.
#[derive(Parser, Debug)]
struct Args {
    #[arg(default_value = "data/collisions.csv")]
    path: PathBuf,

    #[arg(short, long, value_enum, default_value = "column")]
    layout: LayoutArg,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let _profiler = dhat::Profiler::new_heap();

    match args.layout {
        LayoutArg::Row => profile::<RowStore>(&args)?,
        LayoutArg::Column => profile::<ColumnStore>(&args)?,
    }

    let stats = dhat::HeapStats::get();
    println!(
        "peak heap {} bytes in {} blocks, {} allocations total",
        stats.max_bytes, stats.max_blocks, stats.total_blocks
    );
    println!("Memory benchmark finished. See dhat-heap.json for details");
    Ok(())
}

fn profile<S: RecordStore>(args: &Args) -> Result<(), Box<dyn Error>> {
    let mut dataset = CollisionDataset::<S>::sequential();
    let summary = dataset.load(&args.path)?;
    let hits = dataset.search_by_injury_threshold(1);
    println!(
        "{} layout: {} rows, {} with injuries",
        S::LAYOUT.name(),
        summary.rows_processed,
        hits.len()
    );
    Ok(())
}

use std::io::{BufWriter, Write};

use collision_processor::processor::record::COLUMN_NAMES;
use tempfile::NamedTempFile;

const BOROUGHS: [&str; 5] = ["BROOKLYN", "QUEENS", "BRONX", "MANHATTAN", "STATEN ISLAND"];

/// Deterministic collisions file with `rows` data lines.
pub fn collisions_file(rows: usize) -> NamedTempFile {
    let tmp = NamedTempFile::new().unwrap();
    let mut writer = BufWriter::new(tmp.reopen().unwrap());
    writeln!(writer, "{}", COLUMN_NAMES.join(",")).unwrap();
    for i in 0..rows {
        let lat = 40.5 + (i % 400) as f64 * 0.001;
        let lon = -74.2 + (i % 500) as f64 * 0.001;
        writeln!(
            writer,
            "{:02}/{:02}/{},{}:{:02},{},{},{lat:.6},{lon:.6},\"({lat:.6}, {lon:.6})\",BROADWAY,,,{},0,{},0,{},0,{},0,Unspecified,,,,,{},Sedan,,,,",
            i % 12 + 1,
            i % 28 + 1,
            2015 + i % 10,
            i % 24,
            i % 60,
            BOROUGHS[i % BOROUGHS.len()],
            10001 + i % 700,
            i % 3,
            i % 2,
            i % 4 / 3,
            i % 5,
            i,
        )
        .unwrap();
    }
    writer.flush().unwrap();
    drop(writer);
    tmp
}

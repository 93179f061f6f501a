use clap::Parser;
use collision_processor::processor::record::COLUMN_NAMES;
use rand::Rng;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const BOROUGHS: [&str; 6] = ["BROOKLYN", "QUEENS", "BRONX", "MANHATTAN", "STATEN ISLAND", ""];
const STREETS: [&str; 6] = [
    "ATLANTIC AVENUE",
    "BROADWAY",
    "WHITESTONE EXPRESSWAY",
    "GRAND CONCOURSE",
    "HYLAN BOULEVARD",
    "",
];
const FACTORS: [&str; 5] = [
    "Unspecified",
    "Driver Inattention/Distraction",
    "Failure to Yield Right-of-Way",
    "Following Too Closely",
    "Aggressive Driving/Road Rage",
];
const VEHICLES: [&str; 4] = ["Sedan", "Station Wagon/Sport Utility Vehicle", "Taxi", "Bike"];

/// Writes a synthetic collisions CSV in the 29-column export layout.
#[derive(Parser, Debug)]
struct Args {
    #[arg(short, long, default_value = "data/collisions.csv")]
    output: PathBuf,

    #[arg(short, long, default_value_t = 1_000_000)]
    rows: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let file = File::create(&args.output)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", COLUMN_NAMES.join(","))?;

    let mut rng = rand::rng();
    for i in 0..args.rows {
        let month = rng.random_range(1..=12);
        let day = rng.random_range(1..=28);
        let year = rng.random_range(2012..=2024);
        let hour = rng.random_range(0..24);
        let minute = rng.random_range(0..60);

        let borough = BOROUGHS[rng.random_range(0..BOROUGHS.len())];
        let (zip, lat, long, location) = if rng.random_bool(0.9) {
            let lat = rng.random_range(40.49..40.92);
            let long = rng.random_range(-74.26..-73.69);
            (
                rng.random_range(10001..11698).to_string(),
                format!("{lat:.6}"),
                format!("{long:.6}"),
                format!("\"({lat:.6}, {long:.6})\""),
            )
        } else {
            (String::new(), String::new(), String::new(), String::new())
        };

        write!(
            writer,
            "{:02}/{:02}/{},{}:{:02},{},{},{},{},{},{},{},,",
            month,
            day,
            year,
            hour,
            minute,
            borough,
            zip,
            lat,
            long,
            location,
            STREETS[rng.random_range(0..STREETS.len())],
            STREETS[rng.random_range(0..STREETS.len())],
        )?;

        // injured/killed pairs for persons, pedestrians, cyclists, motorists
        for _ in 0..4 {
            let injured: u32 = if rng.random_bool(0.3) {
                rng.random_range(1..5)
            } else {
                0
            };
            let killed: u32 = if rng.random_bool(0.002) { 1 } else { 0 };
            write!(writer, "{},{},", injured, killed)?;
        }

        let vehicles = rng.random_range(1..=5);
        for slot in 0..5 {
            let factor = if slot < vehicles {
                FACTORS[rng.random_range(0..FACTORS.len())]
            } else {
                ""
            };
            write!(writer, "{},", factor)?;
        }
        write!(writer, "{}", 4_000_000 + i)?;
        for slot in 0..5 {
            let vehicle = if slot < vehicles {
                VEHICLES[rng.random_range(0..VEHICLES.len())]
            } else {
                ""
            };
            write!(writer, ",{}", vehicle)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;

    println!("Sample CSV generated: {}", args.output.display());
    Ok(())
}

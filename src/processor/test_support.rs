use std::io::Write;

use tempfile::NamedTempFile;

use crate::processor::record::COLUMN_NAMES;

pub(crate) const SAMPLE: &str = "09/11/2021,2:39,BROOKLYN,11208,40.667202,-73.8665,\"(40.667202, -73.8665)\",WHITESTONE EXPRESSWAY,20 AVENUE,,2,0,1,0,0,0,1,0,Aggressive Driving/Road Rage,Unspecified,,,,4455765,Sedan,Sedan,,,";

pub(crate) fn header() -> String {
    COLUMN_NAMES.join(",")
}

/// Fields that matter to the searches; the rest is filler.
#[derive(Debug, Clone)]
pub(crate) struct Row<'a> {
    pub id: i64,
    pub date: &'a str,
    pub borough: &'a str,
    pub zip: &'a str,
    pub lat: &'a str,
    pub lon: &'a str,
    /// persons, pedestrians, cyclists, motorists
    pub injured: [u32; 4],
}

impl Default for Row<'_> {
    fn default() -> Self {
        Row {
            id: 1,
            date: "01/01/2020",
            borough: "QUEENS",
            zip: "11101",
            lat: "40.7",
            lon: "-73.9",
            injured: [0; 4],
        }
    }
}

impl Row<'_> {
    pub fn line(&self) -> String {
        let [persons, pedestrians, cyclists, motorists] = self.injured;
        format!(
            "{},12:00,{},{},{},{},\"({}, {})\",MAIN STREET,,,{},0,{},0,{},0,{},0,Unspecified,,,,,{},Sedan,,,,",
            self.date,
            self.borough,
            self.zip,
            self.lat,
            self.lon,
            self.lat,
            self.lon,
            persons,
            pedestrians,
            cyclists,
            motorists,
            self.id
        )
    }
}

/// Writes a source file with the standard header followed by `lines`.
pub(crate) fn write_source(lines: &[String]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    writeln!(tmp, "{}", header()).unwrap();
    for line in lines {
        writeln!(tmp, "{}", line).unwrap();
    }
    tmp.flush().unwrap();
    tmp
}

/// `count` distinct rows spread over five boroughs, several years and a grid of coordinates.
pub(crate) fn varied_lines(count: usize) -> Vec<String> {
    const BOROUGHS: [&str; 5] = ["BROOKLYN", "QUEENS", "BRONX", "MANHATTAN", "STATEN ISLAND"];
    (0..count)
        .map(|i| {
            let date = format!("{:02}/{:02}/{}", i % 12 + 1, i % 28 + 1, 2018 + i % 4);
            let zip = format!("{}", 10001 + i % 7);
            let lat = format!("{:.4}", 40.5 + (i % 50) as f64 * 0.01);
            let lon = format!("{:.4}", -74.2 + (i % 40) as f64 * 0.015);
            Row {
                id: i as i64 + 1,
                date: &date,
                borough: BOROUGHS[i % BOROUGHS.len()],
                zip: &zip,
                lat: &lat,
                lon: &lon,
                injured: [(i % 3) as u32, (i % 2) as u32, 0, (i % 5) as u32],
            }
            .line()
        })
        .collect()
}

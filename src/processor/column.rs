use std::ops::Range;

use crate::{
    helpers::simd_helpers::{filter_f64_between, filter_i64_between},
    processor::{
        SearchPredicate,
        record::{CollisionRecord, VEHICLE_SLOTS},
        store::{Layout, RecordStore},
    },
};

/// Column layout: one contiguous array per field.
///
/// Index `i` in every array belongs to the same logical record, so all arrays
/// always have the same length.
#[derive(Debug, Default, Clone)]
pub struct ColumnStore {
    crash_dates: Vec<i64>,
    crash_times: Vec<String>,
    boroughs: Vec<String>,
    postal_codes: Vec<i32>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    locations: Vec<String>,
    on_street_names: Vec<String>,
    cross_street_names: Vec<String>,
    off_street_names: Vec<String>,

    persons_injured: Vec<u32>,
    persons_killed: Vec<u32>,
    pedestrians_injured: Vec<u32>,
    pedestrians_killed: Vec<u32>,
    cyclists_injured: Vec<u32>,
    cyclists_killed: Vec<u32>,
    motorists_injured: Vec<u32>,
    motorists_killed: Vec<u32>,

    contributing_factors: [Vec<String>; VEHICLE_SLOTS],
    collision_ids: Vec<i64>,
    vehicle_type_codes: [Vec<String>; VEHICLE_SLOTS],
}

impl ColumnStore {
    pub fn crash_dates(&self) -> &[i64] {
        &self.crash_dates
    }

    pub fn crash_times(&self) -> &[String] {
        &self.crash_times
    }

    pub fn boroughs(&self) -> &[String] {
        &self.boroughs
    }

    pub fn postal_codes(&self) -> &[i32] {
        &self.postal_codes
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn on_street_names(&self) -> &[String] {
        &self.on_street_names
    }

    pub fn cross_street_names(&self) -> &[String] {
        &self.cross_street_names
    }

    pub fn off_street_names(&self) -> &[String] {
        &self.off_street_names
    }

    pub fn persons_injured(&self) -> &[u32] {
        &self.persons_injured
    }

    pub fn persons_killed(&self) -> &[u32] {
        &self.persons_killed
    }

    pub fn pedestrians_injured(&self) -> &[u32] {
        &self.pedestrians_injured
    }

    pub fn pedestrians_killed(&self) -> &[u32] {
        &self.pedestrians_killed
    }

    pub fn cyclists_injured(&self) -> &[u32] {
        &self.cyclists_injured
    }

    pub fn cyclists_killed(&self) -> &[u32] {
        &self.cyclists_killed
    }

    pub fn motorists_injured(&self) -> &[u32] {
        &self.motorists_injured
    }

    pub fn motorists_killed(&self) -> &[u32] {
        &self.motorists_killed
    }

    /// Contributing factor column for vehicle `slot` (0-based).
    pub fn contributing_factors(&self, slot: usize) -> Option<&[String]> {
        self.contributing_factors.get(slot).map(Vec::as_slice)
    }

    pub fn collision_ids(&self) -> &[i64] {
        &self.collision_ids
    }

    /// Vehicle type code column for vehicle `slot` (0-based).
    pub fn vehicle_type_codes(&self, slot: usize) -> Option<&[String]> {
        self.vehicle_type_codes.get(slot).map(Vec::as_slice)
    }

    /// True when every array has the same length.
    pub fn is_aligned(&self) -> bool {
        let n = self.crash_dates.len();
        [
            self.crash_times.len(),
            self.boroughs.len(),
            self.postal_codes.len(),
            self.latitudes.len(),
            self.longitudes.len(),
            self.locations.len(),
            self.on_street_names.len(),
            self.cross_street_names.len(),
            self.off_street_names.len(),
            self.persons_injured.len(),
            self.persons_killed.len(),
            self.pedestrians_injured.len(),
            self.pedestrians_killed.len(),
            self.cyclists_injured.len(),
            self.cyclists_killed.len(),
            self.motorists_injured.len(),
            self.motorists_killed.len(),
            self.collision_ids.len(),
        ]
        .into_iter()
        .chain(self.contributing_factors.iter().map(Vec::len))
        .chain(self.vehicle_type_codes.iter().map(Vec::len))
        .all(|len| len == n)
    }

    fn total_injured(&self, idx: usize) -> u64 {
        u64::from(self.persons_injured[idx])
            + u64::from(self.pedestrians_injured[idx])
            + u64::from(self.cyclists_injured[idx])
            + u64::from(self.motorists_injured[idx])
    }
}

impl RecordStore for ColumnStore {
    const LAYOUT: Layout = Layout::Column;

    fn with_capacity(capacity: usize) -> Self {
        let mut store = ColumnStore::default();
        store.reserve(capacity);
        store
    }

    fn reserve(&mut self, additional: usize) {
        self.crash_dates.reserve(additional);
        self.crash_times.reserve(additional);
        self.boroughs.reserve(additional);
        self.postal_codes.reserve(additional);
        self.latitudes.reserve(additional);
        self.longitudes.reserve(additional);
        self.locations.reserve(additional);
        self.on_street_names.reserve(additional);
        self.cross_street_names.reserve(additional);
        self.off_street_names.reserve(additional);
        self.persons_injured.reserve(additional);
        self.persons_killed.reserve(additional);
        self.pedestrians_injured.reserve(additional);
        self.pedestrians_killed.reserve(additional);
        self.cyclists_injured.reserve(additional);
        self.cyclists_killed.reserve(additional);
        self.motorists_injured.reserve(additional);
        self.motorists_killed.reserve(additional);
        for column in &mut self.contributing_factors {
            column.reserve(additional);
        }
        self.collision_ids.reserve(additional);
        for column in &mut self.vehicle_type_codes {
            column.reserve(additional);
        }
    }

    fn len(&self) -> usize {
        self.crash_dates.len()
    }

    fn push(&mut self, record: CollisionRecord) {
        self.crash_dates.push(record.crash_date);
        self.crash_times.push(record.crash_time);
        self.boroughs.push(record.borough);
        self.postal_codes.push(record.postal_code);
        self.latitudes.push(record.latitude);
        self.longitudes.push(record.longitude);
        self.locations.push(record.location);
        self.on_street_names.push(record.on_street_name);
        self.cross_street_names.push(record.cross_street_name);
        self.off_street_names.push(record.off_street_name);
        self.persons_injured.push(record.persons_injured);
        self.persons_killed.push(record.persons_killed);
        self.pedestrians_injured.push(record.pedestrians_injured);
        self.pedestrians_killed.push(record.pedestrians_killed);
        self.cyclists_injured.push(record.cyclists_injured);
        self.cyclists_killed.push(record.cyclists_killed);
        self.motorists_injured.push(record.motorists_injured);
        self.motorists_killed.push(record.motorists_killed);
        for (column, value) in self
            .contributing_factors
            .iter_mut()
            .zip(record.contributing_factors)
        {
            column.push(value);
        }
        self.collision_ids.push(record.collision_id);
        for (column, value) in self
            .vehicle_type_codes
            .iter_mut()
            .zip(record.vehicle_type_codes)
        {
            column.push(value);
        }
    }

    fn append(&mut self, mut other: Self) {
        if self.is_empty() && self.crash_dates.capacity() < other.len() {
            *self = other;
            return;
        }

        self.crash_dates.append(&mut other.crash_dates);
        self.crash_times.append(&mut other.crash_times);
        self.boroughs.append(&mut other.boroughs);
        self.postal_codes.append(&mut other.postal_codes);
        self.latitudes.append(&mut other.latitudes);
        self.longitudes.append(&mut other.longitudes);
        self.locations.append(&mut other.locations);
        self.on_street_names.append(&mut other.on_street_names);
        self.cross_street_names.append(&mut other.cross_street_names);
        self.off_street_names.append(&mut other.off_street_names);
        self.persons_injured.append(&mut other.persons_injured);
        self.persons_killed.append(&mut other.persons_killed);
        self.pedestrians_injured.append(&mut other.pedestrians_injured);
        self.pedestrians_killed.append(&mut other.pedestrians_killed);
        self.cyclists_injured.append(&mut other.cyclists_injured);
        self.cyclists_killed.append(&mut other.cyclists_killed);
        self.motorists_injured.append(&mut other.motorists_injured);
        self.motorists_killed.append(&mut other.motorists_killed);
        for (column, theirs) in self
            .contributing_factors
            .iter_mut()
            .zip(other.contributing_factors.iter_mut())
        {
            column.append(theirs);
        }
        self.collision_ids.append(&mut other.collision_ids);
        for (column, theirs) in self
            .vehicle_type_codes
            .iter_mut()
            .zip(other.vehicle_type_codes.iter_mut())
        {
            column.append(theirs);
        }

        debug_assert!(self.is_aligned());
    }

    fn record(&self, idx: usize) -> Option<CollisionRecord> {
        if idx >= self.len() {
            return None;
        }

        Some(CollisionRecord {
            crash_date: self.crash_dates[idx],
            crash_time: self.crash_times[idx].clone(),
            borough: self.boroughs[idx].clone(),
            postal_code: self.postal_codes[idx],
            latitude: self.latitudes[idx],
            longitude: self.longitudes[idx],
            location: self.locations[idx].clone(),
            on_street_name: self.on_street_names[idx].clone(),
            cross_street_name: self.cross_street_names[idx].clone(),
            off_street_name: self.off_street_names[idx].clone(),
            persons_injured: self.persons_injured[idx],
            persons_killed: self.persons_killed[idx],
            pedestrians_injured: self.pedestrians_injured[idx],
            pedestrians_killed: self.pedestrians_killed[idx],
            cyclists_injured: self.cyclists_injured[idx],
            cyclists_killed: self.cyclists_killed[idx],
            motorists_injured: self.motorists_injured[idx],
            motorists_killed: self.motorists_killed[idx],
            contributing_factors: std::array::from_fn(|slot| {
                self.contributing_factors[slot][idx].clone()
            }),
            collision_id: self.collision_ids[idx],
            vehicle_type_codes: std::array::from_fn(|slot| {
                self.vehicle_type_codes[slot][idx].clone()
            }),
        })
    }

    fn matches(&self, idx: usize, predicate: &SearchPredicate) -> bool {
        match predicate {
            SearchPredicate::DateRange { start, end } => {
                (*start..=*end).contains(&self.crash_dates[idx])
            }
            SearchPredicate::Borough(borough) => self.boroughs[idx] == *borough,
            SearchPredicate::PostalCode(code) => self.postal_codes[idx] == *code,
            SearchPredicate::InjuryThreshold(min) => self.total_injured(idx) >= u64::from(*min),
            SearchPredicate::Bounds {
                min_lat,
                max_lat,
                min_long,
                max_long,
            } => {
                let (lat, long) = (self.latitudes[idx], self.longitudes[idx]);
                lat >= *min_lat && lat <= *max_lat && long >= *min_long && long <= *max_long
            }
        }
    }

    /// Column scans touch only the arrays the predicate reads.
    fn scan(&self, predicate: &SearchPredicate, range: Range<usize>, out: &mut Vec<usize>) {
        let base = range.start;
        match predicate {
            SearchPredicate::DateRange { start, end } => {
                filter_i64_between(&self.crash_dates[range], *start, *end, base, out);
            }
            SearchPredicate::Borough(borough) => {
                out.extend(
                    self.boroughs[range]
                        .iter()
                        .enumerate()
                        .filter(|(_, b)| *b == borough)
                        .map(|(offset, _)| base + offset),
                );
            }
            SearchPredicate::PostalCode(code) => {
                out.extend(
                    self.postal_codes[range]
                        .iter()
                        .enumerate()
                        .filter(|&(_, zip)| zip == code)
                        .map(|(offset, _)| base + offset),
                );
            }
            SearchPredicate::InjuryThreshold(min) => {
                let min = u64::from(*min);
                out.extend(range.filter(|&idx| self.total_injured(idx) >= min));
            }
            SearchPredicate::Bounds {
                min_lat,
                max_lat,
                min_long,
                max_long,
            } => {
                let first = out.len();
                filter_f64_between(&self.latitudes[range], *min_lat, *max_lat, base, out);
                let mut write = first;
                for read in first..out.len() {
                    let long = self.longitudes[out[read]];
                    if long >= *min_long && long <= *max_long {
                        out[write] = out[read];
                        write += 1;
                    }
                }
                out.truncate(write);
            }
        }
    }
}

use tracing::warn;

use crate::processor::{ConversionError, ParseError, ParseErrorKind, coercion};

/// Number of positional fields every data line must carry.
pub const FIELD_COUNT: usize = 29;

/// Vehicles tracked per collision (contributing factor and type code slots).
pub const VEHICLE_SLOTS: usize = 5;

/// Column names in source order.
pub const COLUMN_NAMES: [&str; FIELD_COUNT] = [
    "CRASH DATE",
    "CRASH TIME",
    "BOROUGH",
    "ZIP CODE",
    "LATITUDE",
    "LONGITUDE",
    "LOCATION",
    "ON STREET NAME",
    "CROSS STREET NAME",
    "OFF STREET NAME",
    "NUMBER OF PERSONS INJURED",
    "NUMBER OF PERSONS KILLED",
    "NUMBER OF PEDESTRIANS INJURED",
    "NUMBER OF PEDESTRIANS KILLED",
    "NUMBER OF CYCLIST INJURED",
    "NUMBER OF CYCLIST KILLED",
    "NUMBER OF MOTORIST INJURED",
    "NUMBER OF MOTORIST KILLED",
    "CONTRIBUTING FACTOR VEHICLE 1",
    "CONTRIBUTING FACTOR VEHICLE 2",
    "CONTRIBUTING FACTOR VEHICLE 3",
    "CONTRIBUTING FACTOR VEHICLE 4",
    "CONTRIBUTING FACTOR VEHICLE 5",
    "COLLISION_ID",
    "VEHICLE TYPE CODE 1",
    "VEHICLE TYPE CODE 2",
    "VEHICLE TYPE CODE 3",
    "VEHICLE TYPE CODE 4",
    "VEHICLE TYPE CODE 5",
];

const CONTRIBUTING_FACTOR_START: usize = 18;
const COLLISION_ID: usize = 23;
const VEHICLE_TYPE_START: usize = 24;

/// One ingested collision event.
///
/// Every field always holds a value: anything missing or unparseable in the
/// source is `0`, `0.0` or an empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionRecord {
    /// Local-midnight Unix timestamp of the crash date.
    pub crash_date: i64,
    /// Time of day, kept as the source text.
    pub crash_time: String,
    pub borough: String,
    pub postal_code: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
    pub on_street_name: String,
    pub cross_street_name: String,
    pub off_street_name: String,

    pub persons_injured: u32,
    pub persons_killed: u32,
    pub pedestrians_injured: u32,
    pub pedestrians_killed: u32,
    pub cyclists_injured: u32,
    pub cyclists_killed: u32,
    pub motorists_injured: u32,
    pub motorists_killed: u32,

    pub contributing_factors: [String; VEHICLE_SLOTS],
    pub collision_id: i64,
    pub vehicle_type_codes: [String; VEHICLE_SLOTS],
}

impl CollisionRecord {
    /// Builds a record from the tokens of one data line.
    ///
    /// The caller guarantees at least [`FIELD_COUNT`] tokens; extra tokens are
    /// ignored. A field whose token fails to convert is defaulted, logged and
    /// reported in `errors`; the remaining fields are still converted.
    pub fn from_tokens(tokens: &[String], line: usize, errors: &mut Vec<ParseError>) -> Self {
        debug_assert!(tokens.len() >= FIELD_COUNT);

        let mut coerce = FieldCoercer { line, errors };

        CollisionRecord {
            crash_date: coerce.field(0, coercion::parse_date(&tokens[0])),
            crash_time: tokens[1].clone(),
            borough: tokens[2].clone(),
            postal_code: coerce.field(3, coercion::parse_i32(&tokens[3])),
            latitude: coerce.field(4, coercion::parse_f64(&tokens[4])),
            longitude: coerce.field(5, coercion::parse_f64(&tokens[5])),
            location: tokens[6].clone(),
            on_street_name: tokens[7].clone(),
            cross_street_name: tokens[8].clone(),
            off_street_name: tokens[9].clone(),
            persons_injured: coerce.field(10, coercion::parse_u32(&tokens[10])),
            persons_killed: coerce.field(11, coercion::parse_u32(&tokens[11])),
            pedestrians_injured: coerce.field(12, coercion::parse_u32(&tokens[12])),
            pedestrians_killed: coerce.field(13, coercion::parse_u32(&tokens[13])),
            cyclists_injured: coerce.field(14, coercion::parse_u32(&tokens[14])),
            cyclists_killed: coerce.field(15, coercion::parse_u32(&tokens[15])),
            motorists_injured: coerce.field(16, coercion::parse_u32(&tokens[16])),
            motorists_killed: coerce.field(17, coercion::parse_u32(&tokens[17])),
            contributing_factors: std::array::from_fn(|slot| {
                tokens[CONTRIBUTING_FACTOR_START + slot].clone()
            }),
            collision_id: coerce.field(COLLISION_ID, coercion::parse_i64(&tokens[COLLISION_ID])),
            vehicle_type_codes: std::array::from_fn(|slot| {
                tokens[VEHICLE_TYPE_START + slot].clone()
            }),
        }
    }

    /// Injured people across all victim classes. Killed counts are not included.
    pub fn total_injured(&self) -> u64 {
        u64::from(self.persons_injured)
            + u64::from(self.pedestrians_injured)
            + u64::from(self.cyclists_injured)
            + u64::from(self.motorists_injured)
    }
}

struct FieldCoercer<'a> {
    line: usize,
    errors: &'a mut Vec<ParseError>,
}

impl FieldCoercer<'_> {
    fn field<T: Default>(&mut self, column: usize, result: Result<T, ConversionError>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    line = self.line,
                    column = COLUMN_NAMES[column],
                    error = %e,
                    "field conversion failed, using default"
                );
                let value = match &e {
                    ConversionError::Int { token, .. }
                    | ConversionError::Float { token, .. }
                    | ConversionError::Date { token, .. } => token.clone(),
                };
                self.errors.push(ParseError {
                    line: self.line,
                    kind: ParseErrorKind::FieldConversion,
                    column: COLUMN_NAMES[column].to_string(),
                    value,
                    error: Some(e.to_string()),
                });
                T::default()
            }
        }
    }
}

//! Token to typed-field conversion.
//!
//! Every coercion maps an empty token to the type's zero value (`0`, `0.0`,
//! or the Unix epoch for dates). A non-empty token that does not parse is a
//! [`ConversionError`]. Numeric tokens are trimmed of ASCII whitespace first;
//! string fields are never touched.

use chrono::{Local, NaiveDate, TimeZone};

use crate::processor::ConversionError;

/// Source date pattern (month/day/year).
pub const DATE_FORMAT: &str = "%m/%d/%Y";

pub fn parse_i32(token: &str) -> Result<i32, ConversionError> {
    let trimmed = token.trim_ascii();
    if trimmed.is_empty() {
        return Ok(0);
    }
    atoi_simd::parse::<i32>(trimmed.as_bytes()).map_err(|e| ConversionError::Int {
        token: token.to_string(),
        reason: e.to_string(),
    })
}

pub fn parse_i64(token: &str) -> Result<i64, ConversionError> {
    let trimmed = token.trim_ascii();
    if trimmed.is_empty() {
        return Ok(0);
    }
    atoi_simd::parse::<i64>(trimmed.as_bytes()).map_err(|e| ConversionError::Int {
        token: token.to_string(),
        reason: e.to_string(),
    })
}

/// Counters are non-negative, so a negative token is a conversion failure.
pub fn parse_u32(token: &str) -> Result<u32, ConversionError> {
    let trimmed = token.trim_ascii();
    if trimmed.is_empty() {
        return Ok(0);
    }
    atoi_simd::parse::<u32>(trimmed.as_bytes()).map_err(|e| ConversionError::Int {
        token: token.to_string(),
        reason: e.to_string(),
    })
}

pub fn parse_f64(token: &str) -> Result<f64, ConversionError> {
    let trimmed = token.trim_ascii();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    fast_float::parse::<f64, _>(trimmed).map_err(|e| ConversionError::Float {
        token: token.to_string(),
        reason: e.to_string(),
    })
}

/// Parses a `MM/DD/YYYY` date into the Unix timestamp of local midnight.
pub fn parse_date(token: &str) -> Result<i64, ConversionError> {
    let trimmed = token.trim_ascii();
    if trimmed.is_empty() {
        return Ok(0);
    }
    parse_naive_date(token).map(local_midnight_timestamp)
}

/// Parses a `MM/DD/YYYY` date. Unlike [`parse_date`], an empty token is an error.
pub fn parse_naive_date(token: &str) -> Result<NaiveDate, ConversionError> {
    NaiveDate::parse_from_str(token.trim_ascii(), DATE_FORMAT).map_err(|e| {
        ConversionError::Date {
            token: token.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Unix timestamp of midnight at the start of `date` in the local time zone.
///
/// When midnight falls in a DST gap the naive time is read as UTC.
pub fn local_midnight_timestamp(date: NaiveDate) -> i64 {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    match Local.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.timestamp(),
        None => midnight.and_utc().timestamp(),
    }
}

/// Inverse of [`local_midnight_timestamp`], for display.
pub fn timestamp_to_date(timestamp: i64) -> Option<NaiveDate> {
    Local
        .timestamp_opt(timestamp, 0)
        .earliest()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tokens_default_to_zero() {
        assert_eq!(parse_i32("").unwrap(), 0);
        assert_eq!(parse_i64("").unwrap(), 0);
        assert_eq!(parse_u32("  ").unwrap(), 0);
        assert_eq!(parse_f64("").unwrap(), 0.0);
        assert_eq!(parse_date("").unwrap(), 0);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_i32("11201").unwrap(), 11201);
        assert_eq!(parse_i32(" 10001 ").unwrap(), 10001);
        assert_eq!(parse_i64("4455765").unwrap(), 4_455_765);
        assert_eq!(parse_u32("3").unwrap(), 3);
        assert_eq!(parse_f64("40.667202").unwrap(), 40.667202);
        assert_eq!(parse_f64("-73.8665").unwrap(), -73.8665);
    }

    #[test]
    fn test_bad_tokens_fail() {
        assert!(matches!(parse_i32("N/A"), Err(ConversionError::Int { .. })));
        assert!(matches!(parse_u32("-1"), Err(ConversionError::Int { .. })));
        assert!(matches!(parse_f64("40.1x"), Err(ConversionError::Float { .. })));
        assert!(matches!(
            parse_date("2021-09-11"),
            Err(ConversionError::Date { .. })
        ));
    }

    #[test]
    fn test_conversion_error_keeps_original_token() {
        match parse_i32(" 12a ") {
            Err(ConversionError::Int { token, .. }) => assert_eq!(token, " 12a "),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_date_is_local_midnight() {
        let ts = parse_date("06/15/2020").unwrap();
        let expected = local_midnight_timestamp(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap());
        assert_eq!(ts, expected);
        assert_eq!(
            timestamp_to_date(ts),
            Some(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap())
        );
    }

    #[test]
    fn test_naive_date_rejects_empty() {
        assert!(parse_naive_date("").is_err());
        assert_eq!(
            parse_naive_date("12/31/2020").unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_dates_order_chronologically_not_lexically() {
        // "12/31/2019" > "01/01/2020" as strings
        assert!(parse_date("12/31/2019").unwrap() < parse_date("01/01/2020").unwrap());
    }
}

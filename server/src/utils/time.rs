//! Slot schedule time helpers
//!
//! Slots store their schedule as two separate strings: a calendar date
//! (`YYYY-MM-DD`) and a wall-clock time (`HH:MM`), with no timezone field.
//! Policy: both are interpreted as UTC; callers compare against `Utc::now()`.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::utils::AppError;

/// Combine a slot's date and time strings into a single UTC instant.
///
/// Accepts `HH:MM` and `HH:MM:SS` time formats.
pub fn slot_start_instant(date: &str, time: &str) -> Result<DateTime<Utc>, AppError> {
    let date = parse_date(date)?;
    let time = parse_time(time)?;
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

/// Re-format a slot schedule into canonical zero-padded `YYYY-MM-DD` and
/// `HH:MM` strings.
///
/// chrono accepts unpadded fields (`2027-1-5`, `9:00`); storing those raw
/// would break the lexicographic `ORDER BY date, time` in the listing
/// queries, so writes go through this before persisting.
pub fn normalize_schedule(date: &str, time: &str) -> Result<(String, String), AppError> {
    let date = parse_date(date)?;
    let time = parse_time(time)?;
    Ok((
        date.format("%Y-%m-%d").to_string(),
        time.format("%H:%M").to_string(),
    ))
}

fn parse_date(date: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidSlotTime(format!("Unparsable slot date: {date:?}")))
}

fn parse_time(time: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| AppError::InvalidSlotTime(format!("Unparsable slot time: {time:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_date_and_time() {
        let instant = slot_start_instant("2026-09-01", "14:30").unwrap();
        assert_eq!(instant.hour(), 14);
        assert_eq!(instant.minute(), 30);
    }

    #[test]
    fn accepts_seconds() {
        assert!(slot_start_instant("2026-09-01", "14:30:15").is_ok());
    }

    #[test]
    fn normalizes_unpadded_schedule() {
        let (date, time) = normalize_schedule("2027-1-5", "9:00").unwrap();
        assert_eq!(date, "2027-01-05");
        assert_eq!(time, "09:00");

        let (date, time) = normalize_schedule("2027-01-05", "14:30:15").unwrap();
        assert_eq!(date, "2027-01-05");
        assert_eq!(time, "14:30");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            slot_start_instant("01/09/2026", "14:30"),
            Err(AppError::InvalidSlotTime(_))
        ));
        assert!(matches!(
            slot_start_instant("2026-09-01", "2pm"),
            Err(AppError::InvalidSlotTime(_))
        ));
    }
}

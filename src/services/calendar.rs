//! Wall-clock arithmetic shared by the scheduling services.
//!
//! All times are salon-local and carry no timezone. Intervals are half-open,
//! so a booking ending at 10:00 and one starting at 10:00 never collide.

use std::cmp::Ordering;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::AppError;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Weekday index matching `WorkingHours.weekday` (Sunday = 0).
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Parses a strict `HH:MM` wall-clock string.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, AppError> {
    let invalid = || AppError::validation(format!("invalid time of day (expected HH:MM): {s}"));

    let (h, m) = s.split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

pub fn format_hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn compare_hhmm(a: &str, b: &str) -> Result<Ordering, AppError> {
    Ok(parse_hhmm(a)?.cmp(&parse_hhmm(b)?))
}

/// Half-open overlap test for `[a_start, a_end)` and `[b_start, b_end)`.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable millisecond of `date` (23:59:59.999).
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

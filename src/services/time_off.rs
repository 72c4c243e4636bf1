use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::TimeOff;
use crate::services::calendar;

/// Widens a caller-supplied range to whole days: start to 00:00:00.000 of its
/// day, end to 23:59:59.999 of its day.
pub fn normalize_range(
    starts_at: NaiveDateTime,
    ends_at: NaiveDateTime,
) -> Result<(NaiveDateTime, NaiveDateTime), AppError> {
    if ends_at < starts_at {
        return Err(AppError::validation("time off must not end before it starts"));
    }
    Ok((
        calendar::start_of_day(starts_at.date()),
        calendar::end_of_day(ends_at.date()),
    ))
}

/// The time-off record blocking `date` for `staff_id`, if any.
pub fn covering(
    conn: &Connection,
    staff_id: &str,
    date: NaiveDate,
) -> Result<Option<TimeOff>, AppError> {
    let entries = queries::time_off_overlapping(
        conn,
        staff_id,
        &calendar::start_of_day(date),
        &calendar::end_of_day(date),
    )?;
    Ok(entries.into_iter().find(|t| t.covers(date)))
}

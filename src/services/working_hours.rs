use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{WorkingHours, WorkingInterval};
use crate::services::calendar;

/// Open intervals for `staff_id` on `date`, ordered by start. No rows means
/// the staff member is unavailable that day.
pub fn resolve(
    conn: &Connection,
    staff_id: &str,
    date: NaiveDate,
) -> Result<Vec<WorkingInterval>, AppError> {
    let rows = queries::working_hours_for_weekday(conn, staff_id, calendar::weekday_index(date))?;
    intervals_for(&rows, date)
}

/// Pure form of [`resolve`] over already-loaded rows.
pub fn intervals_for(rows: &[WorkingHours], date: NaiveDate) -> Result<Vec<WorkingInterval>, AppError> {
    let weekday = calendar::weekday_index(date);
    let mut intervals = rows
        .iter()
        .filter(|wh| wh.weekday == weekday)
        .map(WorkingHours::interval)
        .collect::<Result<Vec<_>, _>>()?;
    intervals.sort();
    Ok(intervals)
}

/// Validates and stores a new working interval, refusing overlaps with the
/// staff member's existing intervals on the same weekday.
pub fn add_working_hours(
    conn: &Connection,
    staff_id: &str,
    weekday: u8,
    start: &str,
    end: &str,
) -> Result<WorkingHours, AppError> {
    if weekday > 6 {
        return Err(AppError::validation(format!(
            "weekday must be between 0 (Sunday) and 6, got {weekday}"
        )));
    }
    let interval = WorkingInterval::parse(start, end)?;

    if queries::get_staff(conn, staff_id)?.is_none() {
        return Err(AppError::not_found("staff", staff_id));
    }

    for existing in queries::working_hours_for_weekday(conn, staff_id, weekday)? {
        if existing.interval()?.overlaps(&interval) {
            return Err(AppError::validation(format!(
                "working hours {start}-{end} overlap existing {}-{}",
                existing.start_time, existing.end_time
            )));
        }
    }

    let wh = WorkingHours {
        id: uuid::Uuid::new_v4().to_string(),
        staff_id: staff_id.to_string(),
        weekday,
        start_time: calendar::format_hhmm(interval.start),
        end_time: calendar::format_hhmm(interval.end),
    };
    queries::insert_working_hours(conn, &wh)?;
    tracing::info!(staff_id, weekday, start, end, "working hours added");
    Ok(wh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::catalog;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_resolve_returns_only_matching_weekday_in_order() {
        let conn = db::init_db(":memory:").unwrap();
        let staff = catalog::create_staff(&conn, "Dana").unwrap();
        add_working_hours(&conn, &staff.id, 1, "14:00", "18:00").unwrap();
        add_working_hours(&conn, &staff.id, 1, "09:00", "12:00").unwrap();
        add_working_hours(&conn, &staff.id, 2, "09:00", "17:00").unwrap();

        // 2026-10-19 is a Monday
        let intervals = resolve(&conn, &staff.id, date("2026-10-19")).unwrap();
        let rendered: Vec<_> = intervals
            .iter()
            .map(|iv| format!("{}-{}", calendar::format_hhmm(iv.start), calendar::format_hhmm(iv.end)))
            .collect();
        assert_eq!(rendered, vec!["09:00-12:00", "14:00-18:00"]);
    }

    #[test]
    fn test_resolve_without_rows_is_empty() {
        let conn = db::init_db(":memory:").unwrap();
        let staff = catalog::create_staff(&conn, "Dana").unwrap();
        // Sunday
        assert!(resolve(&conn, &staff.id, date("2026-10-18")).unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_overlap_and_bad_weekday() {
        let conn = db::init_db(":memory:").unwrap();
        let staff = catalog::create_staff(&conn, "Dana").unwrap();
        add_working_hours(&conn, &staff.id, 1, "09:00", "13:00").unwrap();

        let overlap = add_working_hours(&conn, &staff.id, 1, "12:00", "15:00");
        assert!(matches!(overlap, Err(AppError::Validation(_))));

        // touching is fine
        add_working_hours(&conn, &staff.id, 1, "13:00", "15:00").unwrap();

        assert!(matches!(
            add_working_hours(&conn, &staff.id, 7, "09:00", "10:00"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            add_working_hours(&conn, "ghost", 1, "09:00", "10:00"),
            Err(AppError::NotFound(_))
        ));
    }
}

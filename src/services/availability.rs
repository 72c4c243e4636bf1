//! Bookable-slot computation.
//!
//! Reads are deliberately not transactional with writes: a slot reported
//! here may be taken by the time the client books it, and
//! [`crate::services::lifecycle::create_appointment`] re-checks under its
//! own transaction.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::working_hours::minutes_of_day;
use crate::models::{Slot, Staff, WorkingInterval};
use crate::services::{calendar, catalog, time_off, working_hours};

/// Everything needed to decide whether one staff member is free on one date.
#[derive(Debug, Clone)]
pub struct StaffDay {
    pub staff_id: String,
    pub date: NaiveDate,
    pub intervals: Vec<WorkingInterval>,
    /// `[start, end)` of the staff member's active appointments that day.
    pub bookings: Vec<(NaiveDateTime, NaiveDateTime)>,
}

impl StaffDay {
    /// Loads the schedule for `staff_id` on `date`, or `None` when time off
    /// blocks the whole day.
    pub fn load(conn: &Connection, staff_id: &str, date: NaiveDate) -> Result<Option<Self>, AppError> {
        if let Some(blocked) = time_off::covering(conn, staff_id, date)? {
            tracing::debug!(staff_id, %date, time_off_id = %blocked.id, kind = blocked.kind.as_str(), "staff on time off");
            return Ok(None);
        }

        let intervals = working_hours::resolve(conn, staff_id, date)?;
        let bookings = queries::active_appointments_overlapping(
            conn,
            staff_id,
            &calendar::start_of_day(date),
            &(calendar::end_of_day(date) + Duration::milliseconds(1)),
        )?
        .into_iter()
        .map(|a| (a.starts_at, a.ends_at))
        .collect();

        Ok(Some(Self {
            staff_id: staff_id.to_string(),
            date,
            intervals,
            bookings,
        }))
    }

    /// Whether `[starts_at, ends_at)` sits inside a single working interval.
    pub fn within_hours(&self, starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> bool {
        if starts_at.date() != self.date || ends_at.date() != self.date || ends_at <= starts_at {
            return false;
        }
        self.intervals
            .iter()
            .any(|iv| iv.contains(starts_at.time(), ends_at.time()))
    }

    pub fn is_booked(&self, starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> bool {
        self.bookings
            .iter()
            .any(|(s, e)| calendar::overlaps(starts_at, ends_at, *s, *e))
    }

    pub fn is_free(&self, starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> bool {
        self.within_hours(starts_at, ends_at) && !self.is_booked(starts_at, ends_at)
    }
}

/// Candidate slots across `days`, time-ordered and de-duplicated. A time is
/// available when at least one staff member is free for the full duration.
pub fn compute_slots(date: NaiveDate, duration_min: i64, step_min: i64, days: &[StaffDay]) -> Vec<Slot> {
    let mut slots: BTreeMap<NaiveTime, bool> = BTreeMap::new();
    if duration_min <= 0 || duration_min > calendar::MINUTES_PER_DAY || step_min <= 0 {
        return vec![];
    }
    let step_min = step_min.min(calendar::MINUTES_PER_DAY);

    for day in days {
        for iv in &day.intervals {
            let end = minutes_of_day(iv.end);
            let mut minute = minutes_of_day(iv.start);
            while minute + duration_min <= end {
                let Some(time) = NaiveTime::from_num_seconds_from_midnight_opt((minute * 60) as u32, 0)
                else {
                    break;
                };
                let starts_at = date.and_time(time);
                let Some(ends_at) = starts_at.checked_add_signed(Duration::minutes(duration_min)) else {
                    break;
                };
                let free = !day.is_booked(starts_at, ends_at);

                let entry = slots.entry(time).or_insert(false);
                *entry = *entry || free;

                minute += step_min;
            }
        }
    }

    slots
        .into_iter()
        .map(|(time, available)| Slot {
            time: calendar::format_hhmm(time),
            available,
        })
        .collect()
}

/// Staff considered for a query: the named member, or every active member
/// qualified for the service, in creation order.
pub fn candidate_staff(
    conn: &Connection,
    service_id: &str,
    staff_id: Option<&str>,
) -> Result<Vec<Staff>, AppError> {
    match staff_id {
        Some(id) => {
            let staff = catalog::require_staff(conn, id)?;
            Ok(if staff.active { vec![staff] } else { vec![] })
        }
        None => Ok(queries::qualified_staff(conn, service_id)?),
    }
}

pub fn get_available_slots(
    conn: &Connection,
    date: NaiveDate,
    service_id: &str,
    staff_id: Option<&str>,
    step_minutes: Option<i64>,
) -> Result<Vec<Slot>, AppError> {
    let service = catalog::require_service(conn, service_id)?;
    if !service.active {
        return Err(AppError::validation(format!("service {service_id} is not active")));
    }

    let mut days = vec![];
    for staff in candidate_staff(conn, service_id, staff_id)? {
        if let Some(day) = StaffDay::load(conn, &staff.id, date)? {
            days.push(day);
        }
    }

    let step = step_minutes.filter(|s| *s > 0).unwrap_or(service.duration_min);
    let slots = compute_slots(date, service.duration_min, step, &days);
    tracing::debug!(%date, service_id, staff = ?staff_id, candidates = days.len(), slots = slots.len(), "computed availability");
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn day(staff_id: &str, hours: &[(&str, &str)], bookings: &[(&str, &str)]) -> StaffDay {
        StaffDay {
            staff_id: staff_id.to_string(),
            date: monday(),
            intervals: hours
                .iter()
                .map(|(s, e)| WorkingInterval::parse(s, e).unwrap())
                .collect(),
            bookings: bookings.iter().map(|(s, e)| (dt(s), dt(e))).collect(),
        }
    }

    fn render(slots: &[Slot]) -> Vec<(String, bool)> {
        slots.iter().map(|s| (s.time.clone(), s.available)).collect()
    }

    #[test]
    fn test_slots_step_by_duration() {
        let days = [day("dana", &[("09:00", "13:00")], &[])];
        let slots = compute_slots(monday(), 60, 60, &days);
        assert_eq!(
            render(&slots),
            vec![
                ("09:00".into(), true),
                ("10:00".into(), true),
                ("11:00".into(), true),
                ("12:00".into(), true),
            ]
        );
    }

    #[test]
    fn test_slot_must_fit_inside_interval() {
        let days = [day("dana", &[("09:00", "10:30")], &[])];
        let slots = compute_slots(monday(), 60, 15, &days);
        let times: Vec<_> = slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["09:00", "09:15", "09:30"]);
    }

    #[test]
    fn test_booked_slot_is_unavailable_but_neighbours_are_not() {
        let days = [day(
            "dana",
            &[("09:00", "13:00")],
            &[("2026-10-19 10:00", "2026-10-19 11:00")],
        )];
        let slots = compute_slots(monday(), 60, 60, &days);
        assert_eq!(
            render(&slots),
            vec![
                ("09:00".into(), true),
                ("10:00".into(), false),
                ("11:00".into(), true),
                ("12:00".into(), true),
            ]
        );
    }

    #[test]
    fn test_finer_step_marks_partial_overlaps() {
        let days = [day(
            "dana",
            &[("09:00", "11:00")],
            &[("2026-10-19 10:00", "2026-10-19 10:30")],
        )];
        let slots = compute_slots(monday(), 30, 15, &days);
        assert_eq!(
            render(&slots),
            vec![
                ("09:00".into(), true),
                ("09:15".into(), true),
                ("09:30".into(), true),
                ("09:45".into(), false),
                ("10:00".into(), false),
                ("10:15".into(), false),
                ("10:30".into(), true),
            ]
        );
    }

    #[test]
    fn test_union_is_available_if_anyone_is_free() {
        let days = [
            day("dana", &[("09:00", "11:00")], &[("2026-10-19 09:00", "2026-10-19 10:00")]),
            day("eli", &[("09:00", "10:00"), ("12:00", "13:00")], &[]),
        ];
        let slots = compute_slots(monday(), 60, 60, &days);
        assert_eq!(
            render(&slots),
            vec![
                ("09:00".into(), true),
                ("10:00".into(), true),
                ("12:00".into(), true),
            ]
        );
    }

    #[test]
    fn test_union_unavailable_when_everyone_busy() {
        let days = [
            day("dana", &[("09:00", "10:00")], &[("2026-10-19 09:00", "2026-10-19 10:00")]),
            day("eli", &[("09:00", "10:00")], &[("2026-10-19 09:30", "2026-10-19 10:30")]),
        ];
        let slots = compute_slots(monday(), 60, 60, &days);
        assert_eq!(render(&slots), vec![("09:00".into(), false)]);
    }

    #[test]
    fn test_out_of_range_duration_or_step_is_harmless() {
        let days = [day("dana", &[("09:00", "13:00")], &[])];
        assert!(compute_slots(monday(), 1_000_000_000_000, 60, &days).is_empty());
        let slots = compute_slots(monday(), 60, i64::MAX, &days);
        assert_eq!(render(&slots), vec![("09:00".into(), true)]);
    }

    #[test]
    fn test_within_hours_counts_seconds() {
        let d = day("dana", &[("09:00", "13:00")], &[]);
        let start = dt("2026-10-19 12:00") + Duration::seconds(30);
        assert!(!d.within_hours(start, start + Duration::minutes(60)));
        assert!(d.within_hours(dt("2026-10-19 12:00"), dt("2026-10-19 13:00")));
    }

    #[test]
    fn test_no_candidates_yields_empty() {
        assert!(compute_slots(monday(), 60, 60, &[]).is_empty());
    }

    #[test]
    fn test_is_free_checks_hours_and_bookings() {
        let d = day(
            "dana",
            &[("09:00", "13:00")],
            &[("2026-10-19 10:00", "2026-10-19 11:00")],
        );
        assert!(d.is_free(dt("2026-10-19 09:00"), dt("2026-10-19 10:00")));
        assert!(!d.is_free(dt("2026-10-19 09:30"), dt("2026-10-19 10:30")));
        assert!(!d.is_free(dt("2026-10-19 12:30"), dt("2026-10-19 13:30")));
        assert!(!d.is_free(dt("2026-10-20 09:00"), dt("2026-10-20 10:00")));
    }
}

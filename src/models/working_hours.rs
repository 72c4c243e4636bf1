use std::cmp::Ordering;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::calendar;

/// One bookable window for a staff member on a weekday (0 = Sunday).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHours {
    pub id: String,
    pub staff_id: String,
    pub weekday: u8,
    pub start_time: String,
    pub end_time: String,
}

impl WorkingHours {
    pub fn interval(&self) -> Result<WorkingInterval, AppError> {
        WorkingInterval::parse(&self.start_time, &self.end_time)
    }
}

/// Half-open `[start, end)` wall-clock range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkingInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkingInterval {
    pub fn parse(start: &str, end: &str) -> Result<Self, AppError> {
        if calendar::compare_hhmm(start, end)? != Ordering::Less {
            return Err(AppError::validation(format!(
                "working interval must end after it starts ({start} >= {end})"
            )));
        }
        Ok(Self {
            start: calendar::parse_hhmm(start)?,
            end: calendar::parse_hhmm(end)?,
        })
    }

    pub fn overlaps(&self, other: &WorkingInterval) -> bool {
        calendar::overlaps(self.start, self.end, other.start, other.end)
    }

    /// Whether `[start, end)` lies entirely inside this interval.
    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start < end && start >= self.start && end <= self.end
    }
}

pub(crate) fn minutes_of_day(t: NaiveTime) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        calendar::parse_hhmm(s).unwrap()
    }

    #[test]
    fn test_parse_rejects_inverted_interval() {
        assert!(WorkingInterval::parse("13:00", "09:00").is_err());
        assert!(WorkingInterval::parse("09:00", "09:00").is_err());
        assert!(WorkingInterval::parse("9am", "10:00").is_err());
    }

    #[test]
    fn test_contains_respects_end_boundary() {
        let iv = WorkingInterval::parse("09:00", "13:00").unwrap();
        assert!(iv.contains(t("09:00"), t("10:00")));
        assert!(iv.contains(t("12:00"), t("13:00")));
        assert!(!iv.contains(t("12:30"), t("13:30")));
        assert!(!iv.contains(t("08:30"), t("09:30")));
    }

    #[test]
    fn test_contains_keeps_seconds() {
        let iv = WorkingInterval::parse("09:00", "13:00").unwrap();
        let start = NaiveTime::from_hms_opt(12, 0, 30).unwrap();
        let end = NaiveTime::from_hms_opt(13, 0, 30).unwrap();
        assert!(!iv.contains(start, end));
        assert!(!iv.contains(NaiveTime::from_hms_opt(8, 59, 59).unwrap(), t("09:30")));
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let morning = WorkingInterval::parse("09:00", "12:00").unwrap();
        let afternoon = WorkingInterval::parse("12:00", "17:00").unwrap();
        let lunch = WorkingInterval::parse("11:30", "12:30").unwrap();
        assert!(!morning.overlaps(&afternoon));
        assert!(morning.overlaps(&lunch));
        assert!(afternoon.overlaps(&lunch));
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeOffKind {
    SickLeave,
    Vacation,
    Other,
}

impl TimeOffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOffKind::SickLeave => "SICK_LEAVE",
            TimeOffKind::Vacation => "VACATION",
            TimeOffKind::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "SICK_LEAVE" => Ok(TimeOffKind::SickLeave),
            "VACATION" => Ok(TimeOffKind::Vacation),
            "OTHER" => Ok(TimeOffKind::Other),
            other => Err(AppError::validation(format!("unknown time-off type: {other}"))),
        }
    }
}

/// A closed whole-day range during which a staff member takes no bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeOff {
    pub id: String,
    pub staff_id: String,
    #[serde(rename = "type")]
    pub kind: TimeOffKind,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

impl TimeOff {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.starts_at.date() <= date && date <= self.ends_at.date()
    }
}

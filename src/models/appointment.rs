use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub service_id: String,
    /// `None` once a cascade has released the booking for reassignment.
    pub staff_id: Option<String>,
    pub client_id: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancelled_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
    ReschedulePending,
}

impl AppointmentStatus {
    pub const ACTIVE: [AppointmentStatus; 2] =
        [AppointmentStatus::Pending, AppointmentStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
            AppointmentStatus::ReschedulePending => "RESCHEDULE_PENDING",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "PENDING" => Ok(AppointmentStatus::Pending),
            "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            "NO_SHOW" => Ok(AppointmentStatus::NoShow),
            "RESCHEDULE_PENDING" => Ok(AppointmentStatus::ReschedulePending),
            other => Err(AppError::validation(format!("unknown appointment status: {other}"))),
        }
    }

    /// Active appointments hold their slot and are subject to cascades.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Transitions an administrator may request directly. `ReschedulePending`
    /// is never a valid target here; only cascades move appointments into it.
    pub fn valid_admin_transitions(&self) -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled, NoShow],
            Confirmed => &[Completed, Cancelled, NoShow],
            ReschedulePending => &[Cancelled],
            Completed | Cancelled | NoShow => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_admin_transitions().contains(&next)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who asked for a cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Client(String),
    Admin,
}

impl Actor {
    pub fn label(&self) -> String {
        match self {
            Actor::Client(id) => format!("client:{id}"),
            Actor::Admin => "admin".to_string(),
        }
    }
}

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub duration_min: i64,
    pub price_cents: i64,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

impl Service {
    /// Slot length for this service.
    pub fn duration(&self) -> Result<Duration, AppError> {
        Duration::try_minutes(self.duration_min).ok_or_else(|| {
            AppError::validation(format!("service {} has an unusable duration", self.id))
        })
    }

    /// End of an appointment for this service starting at `starts_at`.
    pub fn ends_at(&self, starts_at: NaiveDateTime) -> Result<NaiveDateTime, AppError> {
        starts_at
            .checked_add_signed(self.duration()?)
            .ok_or_else(|| AppError::validation(format!("{starts_at} plus service {} is out of range", self.id)))
    }
}

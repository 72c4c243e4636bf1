use std::env;

use crate::services::calendar::MINUTES_PER_DAY;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Step between candidate slot starts. `None` means "use the service duration".
    pub slot_step_minutes: Option<i64>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbook.db".to_string()),
            slot_step_minutes: parse_slot_step(env::var("SLOT_STEP_MINUTES").ok().as_deref()),
        }
    }
}

/// Positive steps are clamped to one day; anything else falls back to the
/// service duration.
fn parse_slot_step(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|step| *step > 0)
        .map(|step| step.min(MINUTES_PER_DAY))
}

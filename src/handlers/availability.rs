use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Slot;
use crate::services::availability;
use crate::state::AppState;

// GET /api/availability?date&service_id&staff_id
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub service_id: String,
    pub staff_id: Option<String>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let slots = {
        let db = state.conn()?;
        availability::get_available_slots(
            &db,
            query.date,
            &query.service_id,
            query.staff_id.as_deref(),
            state.config.slot_step_minutes,
        )?
    };
    Ok(Json(slots))
}

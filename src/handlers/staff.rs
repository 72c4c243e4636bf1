use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Staff, TimeOff, TimeOffKind, WorkingHours};
use crate::services::cascade::{self, NewTimeOff, TimeOffOutcome};
use crate::services::{catalog, working_hours};
use crate::state::AppState;

// GET /api/staff
pub async fn list_staff(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Staff>>, AppError> {
    let staff = {
        let db = state.conn()?;
        queries::list_active_staff(&db)?
    };
    Ok(Json(staff))
}

// POST /api/staff
#[derive(Deserialize)]
pub struct CreateStaffRequest {
    pub name: String,
}

pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<Staff>), AppError> {
    let staff = {
        let db = state.conn()?;
        catalog::create_staff(&db, &body.name)?
    };
    Ok((StatusCode::CREATED, Json(staff)))
}

// DELETE /api/staff/:id
#[derive(Serialize)]
pub struct DeleteStaffResponse {
    pub affected_appointments: usize,
}

pub async fn delete_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteStaffResponse>, AppError> {
    let affected = {
        let mut db = state.conn()?;
        cascade::delete_staff(&mut db, &id, Local::now().naive_local())?
    };
    Ok(Json(DeleteStaffResponse {
        affected_appointments: affected,
    }))
}

// POST /api/staff/:id/services
#[derive(Deserialize)]
pub struct AssignServiceRequest {
    pub service_id: String,
}

pub async fn assign_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AssignServiceRequest>,
) -> Result<StatusCode, AppError> {
    {
        let db = state.conn()?;
        catalog::assign_service(&db, &id, &body.service_id)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/staff/:id/working-hours
pub async fn list_working_hours(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<WorkingHours>>, AppError> {
    let hours = {
        let db = state.conn()?;
        catalog::require_staff(&db, &id)?;
        queries::list_working_hours(&db, &id)?
    };
    Ok(Json(hours))
}

// POST /api/staff/:id/working-hours
#[derive(Deserialize)]
pub struct WorkingHoursRequest {
    pub weekday: u8,
    pub start: String,
    pub end: String,
}

pub async fn add_working_hours(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<WorkingHoursRequest>,
) -> Result<(StatusCode, Json<WorkingHours>), AppError> {
    let hours = {
        let db = state.conn()?;
        working_hours::add_working_hours(&db, &id, body.weekday, &body.start, &body.end)?
    };
    Ok((StatusCode::CREATED, Json(hours)))
}

// GET /api/staff/:id/time-off
pub async fn list_time_off(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TimeOff>>, AppError> {
    let entries = {
        let db = state.conn()?;
        catalog::require_staff(&db, &id)?;
        queries::list_time_off(&db, &id)?
    };
    Ok(Json(entries))
}

// POST /api/staff/:id/time-off
#[derive(Deserialize)]
pub struct TimeOffRequest {
    #[serde(rename = "type")]
    pub kind: TimeOffKind,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub reason: Option<String>,
}

pub async fn create_time_off(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TimeOffRequest>,
) -> Result<(StatusCode, Json<TimeOffOutcome>), AppError> {
    let req = NewTimeOff {
        kind: body.kind,
        starts_at: body.starts_at,
        ends_at: body.ends_at,
        reason: body.reason,
    };

    let outcome = {
        let mut db = state.conn()?;
        cascade::create_time_off(&mut db, &id, req)?
    };
    Ok((StatusCode::CREATED, Json(outcome)))
}

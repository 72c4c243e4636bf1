use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::db::queries::{self, AppointmentFilter};
use crate::errors::AppError;
use crate::models::{Actor, Appointment, AppointmentStatus};
use crate::services::lifecycle::{self, NewAppointment};
use crate::state::AppState;

// POST /api/appointments
#[derive(Deserialize)]
pub struct CreateAppointmentRequest {
    pub service_id: String,
    pub staff_id: Option<String>,
    pub client_id: String,
    pub starts_at: NaiveDateTime,
    pub notes: Option<String>,
}

pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let req = NewAppointment {
        service_id: body.service_id,
        staff_id: body.staff_id,
        client_id: body.client_id,
        starts_at: body.starts_at,
        notes: body.notes,
    };

    let appointment = {
        let mut db = state.conn()?;
        lifecycle::create_appointment(&mut db, req)?
    };
    Ok((StatusCode::CREATED, Json(appointment)))
}

// GET /api/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub status: Option<String>,
    pub staff_id: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let filter = AppointmentFilter {
        staff_id: query.staff_id,
        status: query.status.as_deref().map(AppointmentStatus::parse).transpose()?,
        limit: query.limit,
    };

    let appointments = {
        let db = state.conn()?;
        queries::list_appointments(&db, &filter)?
    };
    Ok(Json(appointments))
}

// GET /api/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = {
        let db = state.conn()?;
        lifecycle::require_appointment(&db, &id)?
    };
    Ok(Json(appointment))
}

// PATCH /api/appointments/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: AppointmentStatus,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = {
        let mut db = state.conn()?;
        lifecycle::set_status(&mut db, &id, body.status)?
    };
    Ok(Json(appointment))
}

// DELETE /api/appointments/:id
#[derive(Deserialize)]
pub struct CancelQuery {
    /// Present when a client cancels its own booking; absent for admins.
    pub client_id: Option<String>,
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<CancelQuery>,
) -> Result<Json<Appointment>, AppError> {
    let actor = match query.client_id {
        Some(client_id) => Actor::Client(client_id),
        None => Actor::Admin,
    };

    let appointment = {
        let mut db = state.conn()?;
        lifecycle::cancel_appointment(&mut db, &id, &actor)?
    };
    Ok(Json(appointment))
}

// POST /api/appointments/:id/reschedule
#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub staff_id: Option<String>,
    pub starts_at: NaiveDateTime,
}

pub async fn reschedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RescheduleRequest>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = {
        let mut db = state.conn()?;
        lifecycle::reschedule_appointment(&mut db, &id, body.staff_id.as_deref(), body.starts_at)?
    };
    Ok(Json(appointment))
}

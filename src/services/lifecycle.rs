//! Appointment state machine.
//!
//! ```text
//! PENDING ──► CONFIRMED ──► COMPLETED
//!    │            │
//!    ├────────────┼──► CANCELLED | NO_SHOW
//!    └────────────┴──► RESCHEDULE_PENDING   (cascades only)
//!                          ├──► PENDING     (reschedule)
//!                          └──► CANCELLED
//! ```
//!
//! Every write runs in a `BEGIN IMMEDIATE` transaction so the conflict check
//! and the insert/update are one atomic unit.

use chrono::{Local, NaiveDateTime};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::{is_constraint_violation, AppError};
use crate::models::{Actor, Appointment, AppointmentStatus, Service};
use crate::services::assignment::pick_free_staff;
use crate::services::availability::StaffDay;
use crate::services::catalog;

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub service_id: String,
    pub staff_id: Option<String>,
    pub client_id: String,
    pub starts_at: NaiveDateTime,
    pub notes: Option<String>,
}

pub fn create_appointment(conn: &mut Connection, req: NewAppointment) -> Result<Appointment, AppError> {
    if req.client_id.trim().is_empty() {
        return Err(AppError::validation("client id must not be empty"));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let service = active_service(&tx, &req.service_id)?;
    let ends_at = service.ends_at(req.starts_at)?;
    let staff_id = resolve_staff(&tx, &service, req.staff_id.as_deref(), req.starts_at, ends_at)?;

    let now = Local::now().naive_local();
    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        service_id: service.id.clone(),
        staff_id: Some(staff_id),
        client_id: req.client_id,
        starts_at: req.starts_at,
        ends_at,
        status: AppointmentStatus::Pending,
        notes: req.notes,
        cancelled_by: None,
        created_at: now,
        updated_at: now,
    };
    queries::insert_appointment(&tx, &appointment).map_err(slot_taken_or_storage)?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %appointment.id,
        staff_id = ?appointment.staff_id,
        starts_at = %appointment.starts_at,
        "appointment created"
    );
    Ok(appointment)
}

/// Cancels an active appointment. A client may only cancel its own booking.
pub fn cancel_appointment(conn: &mut Connection, id: &str, actor: &Actor) -> Result<Appointment, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let appointment = require_appointment(&tx, id)?;

    if let Actor::Client(client_id) = actor {
        if *client_id != appointment.client_id {
            return Err(AppError::validation(format!(
                "appointment {id} does not belong to client {client_id}"
            )));
        }
    }

    if !appointment.status.is_active() {
        tracing::warn!(appointment_id = id, status = %appointment.status, "cancel rejected");
        return Err(AppError::InvalidTransition(format!(
            "cannot cancel appointment in status {}",
            appointment.status
        )));
    }

    let label = actor.label();
    queries::update_appointment_status(&tx, id, AppointmentStatus::Cancelled, Some(&label))?;
    let updated = require_appointment(&tx, id)?;
    tx.commit()?;

    tracing::info!(appointment_id = id, actor = %label, "appointment cancelled");
    Ok(updated)
}

/// Administrative status change, validated against the transition table.
pub fn set_status(
    conn: &mut Connection,
    id: &str,
    next: AppointmentStatus,
) -> Result<Appointment, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let appointment = require_appointment(&tx, id)?;

    if !appointment.status.can_transition_to(next) {
        tracing::warn!(appointment_id = id, from = %appointment.status, to = %next, "transition rejected");
        return Err(AppError::InvalidTransition(format!(
            "{} -> {next} is not allowed",
            appointment.status
        )));
    }

    let cancelled_by = (next == AppointmentStatus::Cancelled).then(|| Actor::Admin.label());
    queries::update_appointment_status(&tx, id, next, cancelled_by.as_deref())?;
    let updated = require_appointment(&tx, id)?;
    tx.commit()?;

    tracing::info!(appointment_id = id, from = %appointment.status, to = %next, "appointment status changed");
    Ok(updated)
}

/// Gives a reschedule-pending appointment a new staff member and start time,
/// returning it to `PENDING`.
pub fn reschedule_appointment(
    conn: &mut Connection,
    id: &str,
    staff_id: Option<&str>,
    starts_at: NaiveDateTime,
) -> Result<Appointment, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let appointment = require_appointment(&tx, id)?;

    if appointment.status != AppointmentStatus::ReschedulePending {
        return Err(AppError::InvalidTransition(format!(
            "only RESCHEDULE_PENDING appointments can be rescheduled (status is {})",
            appointment.status
        )));
    }

    let service = active_service(&tx, &appointment.service_id)?;
    let ends_at = service.ends_at(starts_at)?;
    let assigned = resolve_staff(&tx, &service, staff_id, starts_at, ends_at)?;

    queries::update_appointment_schedule(
        &tx,
        id,
        &assigned,
        &starts_at,
        &ends_at,
        AppointmentStatus::Pending,
    )
    .map_err(slot_taken_or_storage)?;
    let updated = require_appointment(&tx, id)?;
    tx.commit()?;

    tracing::info!(appointment_id = id, staff_id = %assigned, starts_at = %starts_at, "appointment rescheduled");
    Ok(updated)
}

pub fn require_appointment(conn: &Connection, id: &str) -> Result<Appointment, AppError> {
    queries::get_appointment(conn, id)?.ok_or_else(|| AppError::not_found("appointment", id))
}

fn active_service(conn: &Connection, service_id: &str) -> Result<Service, AppError> {
    let service = catalog::require_service(conn, service_id).map_err(|e| match e {
        AppError::NotFound(_) => AppError::validation(format!("unknown service {service_id}")),
        other => other,
    })?;
    if !service.active {
        return Err(AppError::validation(format!("service {service_id} is not active")));
    }
    Ok(service)
}

/// Settles who takes `[starts_at, ends_at)`. A named staff member must be
/// working and unbooked; otherwise the first free qualified staff member in
/// creation order is chosen.
fn resolve_staff(
    conn: &Connection,
    service: &Service,
    requested: Option<&str>,
    starts_at: NaiveDateTime,
    ends_at: NaiveDateTime,
) -> Result<String, AppError> {
    let date = starts_at.date();

    let Some(staff_id) = requested else {
        let mut candidates = vec![];
        for staff in queries::qualified_staff(conn, &service.id)? {
            if let Some(day) = StaffDay::load(conn, &staff.id, date)? {
                candidates.push(day);
            }
        }
        return match pick_free_staff(&candidates, starts_at, ends_at) {
            Some(day) => Ok(day.staff_id.clone()),
            None => {
                tracing::warn!(service_id = %service.id, %starts_at, "no qualified staff free");
                Err(AppError::SlotConflict(format!(
                    "no qualified staff is free at {starts_at}"
                )))
            }
        };
    };

    let staff = catalog::require_staff(conn, staff_id).map_err(|e| match e {
        AppError::NotFound(_) => AppError::validation(format!("unknown staff {staff_id}")),
        other => other,
    })?;
    if !staff.active {
        return Err(AppError::validation(format!("staff {staff_id} is not active")));
    }

    let Some(day) = StaffDay::load(conn, staff_id, date)? else {
        return Err(AppError::validation(format!("staff {staff_id} is off on {date}")));
    };
    if !day.within_hours(starts_at, ends_at) {
        return Err(AppError::validation(format!(
            "{starts_at} - {ends_at} is outside the working hours of staff {staff_id}"
        )));
    }
    if day.is_booked(starts_at, ends_at) {
        tracing::warn!(staff_id, %starts_at, "slot already taken");
        return Err(AppError::SlotConflict(format!(
            "staff {staff_id} is already booked at {starts_at}"
        )));
    }
    Ok(staff_id.to_string())
}

fn slot_taken_or_storage(err: anyhow::Error) -> AppError {
    if is_constraint_violation(&err) {
        AppError::SlotConflict("slot was taken concurrently".to_string())
    } else {
        AppError::Storage(err)
    }
}

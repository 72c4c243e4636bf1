//! Cross-aggregate effects of staff removal and time off.
//!
//! Each entry point wraps the triggering write and every dependent
//! appointment update in one `BEGIN IMMEDIATE` transaction. Any failure after
//! the transaction opens rolls everything back and is reported as
//! `OperationFailed`; lookups keep their own error kinds.

use chrono::{Duration, Local, NaiveDateTime};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{TimeOff, TimeOffKind};
use crate::services::{catalog, time_off};

#[derive(Debug, Clone)]
pub struct NewTimeOff {
    pub kind: TimeOffKind,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeOffOutcome {
    pub time_off: TimeOff,
    pub affected_appointments: usize,
}

/// Releases the staff member's future active appointments for reassignment
/// and removes the staff record. Returns how many appointments were released.
pub fn delete_staff(conn: &mut Connection, staff_id: &str, now: NaiveDateTime) -> Result<usize, AppError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| AppError::OperationFailed(e.to_string()))?;

    let affected = release_and_delete(&tx, staff_id, &now).map_err(AppError::into_cascade_failure)?;

    tx.commit()
        .map_err(|e| AppError::OperationFailed(format!("failed to commit staff deletion: {e}")))?;

    tracing::info!(staff_id, affected, "staff deleted");
    Ok(affected)
}

fn release_and_delete(conn: &Connection, staff_id: &str, now: &NaiveDateTime) -> Result<usize, AppError> {
    catalog::require_staff(conn, staff_id)?;

    let appointments = queries::future_active_appointments(conn, staff_id, now)?;
    for appointment in &appointments {
        if !queries::mark_reschedule_pending(conn, &appointment.id, true)? {
            return Err(AppError::OperationFailed(format!(
                "appointment {} changed during staff deletion",
                appointment.id
            )));
        }
        tracing::debug!(appointment_id = %appointment.id, "released for reassignment");
    }

    if !queries::delete_staff(conn, staff_id)? {
        return Err(AppError::OperationFailed(format!("staff {staff_id} vanished during deletion")));
    }
    Ok(appointments.len())
}

/// Records time off (normalized to whole days) and flags every active
/// appointment of that staff member overlapping the window. The staff
/// reference on flagged appointments is kept.
pub fn create_time_off(
    conn: &mut Connection,
    staff_id: &str,
    req: NewTimeOff,
) -> Result<TimeOffOutcome, AppError> {
    let (starts_at, ends_at) = time_off::normalize_range(req.starts_at, req.ends_at)?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| AppError::OperationFailed(e.to_string()))?;

    let time_off = TimeOff {
        id: uuid::Uuid::new_v4().to_string(),
        staff_id: staff_id.to_string(),
        kind: req.kind,
        starts_at,
        ends_at,
        reason: req.reason,
        created_at: Local::now().naive_local(),
    };
    let affected = record_and_flag(&tx, &time_off).map_err(AppError::into_cascade_failure)?;

    tx.commit()
        .map_err(|e| AppError::OperationFailed(format!("failed to commit time off: {e}")))?;

    tracing::info!(
        staff_id,
        time_off_id = %time_off.id,
        kind = time_off.kind.as_str(),
        affected,
        "time off created"
    );
    Ok(TimeOffOutcome {
        time_off,
        affected_appointments: affected,
    })
}

fn record_and_flag(conn: &Connection, time_off: &TimeOff) -> Result<usize, AppError> {
    catalog::require_staff(conn, &time_off.staff_id)?;
    queries::insert_time_off(conn, time_off)?;

    // The window is closed at 23:59:59.999; the overlap query is half-open.
    let window_end = time_off.ends_at + Duration::milliseconds(1);
    let appointments = queries::active_appointments_overlapping(
        conn,
        &time_off.staff_id,
        &time_off.starts_at,
        &window_end,
    )?;
    for appointment in &appointments {
        if !queries::mark_reschedule_pending(conn, &appointment.id, false)? {
            return Err(AppError::OperationFailed(format!(
                "appointment {} changed during time-off creation",
                appointment.id
            )));
        }
    }
    Ok(appointments.len())
}

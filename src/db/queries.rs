use anyhow::Context;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    Appointment, AppointmentStatus, Service, Staff, TimeOff, TimeOffKind, WorkingHours,
};

/// Millisecond precision keeps time-off end bounds (`23:59:59.999`) exact and
/// sorts lexicographically in chronological order.
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const TS_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_PARSE_FORMAT)
        .with_context(|| format!("malformed timestamp in database: {s}"))
}

fn now_str() -> String {
    format_ts(&chrono::Local::now().naive_local())
}

// ── Staff ──

pub fn insert_staff(conn: &Connection, staff: &Staff) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO staff (id, name, active, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![staff.id, staff.name, staff.active, format_ts(&staff.created_at)],
    )?;
    Ok(())
}

pub fn get_staff(conn: &Connection, id: &str) -> anyhow::Result<Option<Staff>> {
    conn.query_row(
        "SELECT id, name, active, created_at FROM staff WHERE id = ?1",
        params![id],
        |row| Ok(parse_staff_row(row)),
    )
    .optional()?
    .transpose()
}

/// Active staff in creation order.
pub fn list_active_staff(conn: &Connection) -> anyhow::Result<Vec<Staff>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, active, created_at FROM staff WHERE active = 1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_staff_row(row)))?;

    let mut staff = vec![];
    for row in rows {
        staff.push(row??);
    }
    Ok(staff)
}

/// Active staff assigned to a service, in creation order. That order is what
/// makes automatic assignment reproducible.
pub fn qualified_staff(conn: &Connection, service_id: &str) -> anyhow::Result<Vec<Staff>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.active, s.created_at
         FROM staff s
         INNER JOIN staff_services ss ON ss.staff_id = s.id
         WHERE ss.service_id = ?1 AND s.active = 1
         ORDER BY s.rowid ASC",
    )?;
    let rows = stmt.query_map(params![service_id], |row| Ok(parse_staff_row(row)))?;

    let mut staff = vec![];
    for row in rows {
        staff.push(row??);
    }
    Ok(staff)
}

pub fn assign_service(conn: &Connection, staff_id: &str, service_id: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO staff_services (staff_id, service_id) VALUES (?1, ?2)",
        params![staff_id, service_id],
    )?;
    Ok(())
}

pub fn delete_staff(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM staff WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_staff_row(row: &rusqlite::Row) -> anyhow::Result<Staff> {
    let created_at: String = row.get(3)?;
    Ok(Staff {
        id: row.get(0)?,
        name: row.get(1)?,
        active: row.get(2)?,
        created_at: parse_ts(&created_at)?,
    })
}

// ── Services ──

pub fn insert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, name, duration_min, price_cents, active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            service.id,
            service.name,
            service.duration_min,
            service.price_cents,
            service.active,
            format_ts(&service.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    conn.query_row(
        "SELECT id, name, duration_min, price_cents, active, created_at FROM services WHERE id = ?1",
        params![id],
        |row| Ok(parse_service_row(row)),
    )
    .optional()?
    .transpose()
}

pub fn list_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, duration_min, price_cents, active, created_at
         FROM services ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let created_at: String = row.get(5)?;
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        duration_min: row.get(2)?,
        price_cents: row.get(3)?,
        active: row.get(4)?,
        created_at: parse_ts(&created_at)?,
    })
}

// ── Working Hours ──

pub fn insert_working_hours(conn: &Connection, wh: &WorkingHours) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO working_hours (id, staff_id, weekday, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![wh.id, wh.staff_id, wh.weekday, wh.start_time, wh.end_time],
    )?;
    Ok(())
}

pub fn list_working_hours(conn: &Connection, staff_id: &str) -> anyhow::Result<Vec<WorkingHours>> {
    let mut stmt = conn.prepare(
        "SELECT id, staff_id, weekday, start_time, end_time
         FROM working_hours WHERE staff_id = ?1 ORDER BY weekday ASC, start_time ASC",
    )?;
    let rows = stmt.query_map(params![staff_id], parse_working_hours_row)?;

    let mut hours = vec![];
    for row in rows {
        hours.push(row?);
    }
    Ok(hours)
}

pub fn working_hours_for_weekday(
    conn: &Connection,
    staff_id: &str,
    weekday: u8,
) -> anyhow::Result<Vec<WorkingHours>> {
    let mut stmt = conn.prepare(
        "SELECT id, staff_id, weekday, start_time, end_time
         FROM working_hours WHERE staff_id = ?1 AND weekday = ?2 ORDER BY start_time ASC",
    )?;
    let rows = stmt.query_map(params![staff_id, weekday], parse_working_hours_row)?;

    let mut hours = vec![];
    for row in rows {
        hours.push(row?);
    }
    Ok(hours)
}

fn parse_working_hours_row(row: &rusqlite::Row) -> rusqlite::Result<WorkingHours> {
    Ok(WorkingHours {
        id: row.get(0)?,
        staff_id: row.get(1)?,
        weekday: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
    })
}

// ── Time Off ──

pub fn insert_time_off(conn: &Connection, time_off: &TimeOff) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO time_off (id, staff_id, kind, starts_at, ends_at, reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            time_off.id,
            time_off.staff_id,
            time_off.kind.as_str(),
            format_ts(&time_off.starts_at),
            format_ts(&time_off.ends_at),
            time_off.reason,
            format_ts(&time_off.created_at),
        ],
    )?;
    Ok(())
}

pub fn list_time_off(conn: &Connection, staff_id: &str) -> anyhow::Result<Vec<TimeOff>> {
    let mut stmt = conn.prepare(
        "SELECT id, staff_id, kind, starts_at, ends_at, reason, created_at
         FROM time_off WHERE staff_id = ?1 ORDER BY starts_at ASC",
    )?;
    let rows = stmt.query_map(params![staff_id], |row| Ok(parse_time_off_row(row)))?;

    let mut entries = vec![];
    for row in rows {
        entries.push(row??);
    }
    Ok(entries)
}

/// Time-off records touching the closed range `[from, to]`.
pub fn time_off_overlapping(
    conn: &Connection,
    staff_id: &str,
    from: &NaiveDateTime,
    to: &NaiveDateTime,
) -> anyhow::Result<Vec<TimeOff>> {
    let mut stmt = conn.prepare(
        "SELECT id, staff_id, kind, starts_at, ends_at, reason, created_at
         FROM time_off WHERE staff_id = ?1 AND starts_at <= ?3 AND ends_at >= ?2
         ORDER BY starts_at ASC",
    )?;
    let rows = stmt.query_map(params![staff_id, format_ts(from), format_ts(to)], |row| {
        Ok(parse_time_off_row(row))
    })?;

    let mut entries = vec![];
    for row in rows {
        entries.push(row??);
    }
    Ok(entries)
}

fn parse_time_off_row(row: &rusqlite::Row) -> anyhow::Result<TimeOff> {
    let kind: String = row.get(2)?;
    let starts_at: String = row.get(3)?;
    let ends_at: String = row.get(4)?;
    let created_at: String = row.get(6)?;
    Ok(TimeOff {
        id: row.get(0)?,
        staff_id: row.get(1)?,
        kind: TimeOffKind::parse(&kind).map_err(|e| anyhow::anyhow!("{e}"))?,
        starts_at: parse_ts(&starts_at)?,
        ends_at: parse_ts(&ends_at)?,
        reason: row.get(5)?,
        created_at: parse_ts(&created_at)?,
    })
}

// ── Appointments ──

const APPOINTMENT_COLUMNS: &str = "id, service_id, staff_id, client_id, starts_at, ends_at, status, notes, cancelled_by, created_at, updated_at";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, service_id, staff_id, client_id, starts_at, ends_at, status, notes, cancelled_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            appt.id,
            appt.service_id,
            appt.staff_id,
            appt.client_id,
            format_ts(&appt.starts_at),
            format_ts(&appt.ends_at),
            appt.status.as_str(),
            appt.notes,
            appt.cancelled_by,
            format_ts(&appt.created_at),
            format_ts(&appt.updated_at),
        ],
    )
    .context("failed to insert appointment")?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    conn.query_row(
        &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
        params![id],
        |row| Ok(parse_appointment_row(row)),
    )
    .optional()?
    .transpose()
}

#[derive(Debug, Default, Clone)]
pub struct AppointmentFilter {
    pub staff_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub limit: Option<i64>,
}

pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> anyhow::Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE (?1 IS NULL OR staff_id = ?1) AND (?2 IS NULL OR status = ?2)
         ORDER BY starts_at ASC LIMIT ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            filter.staff_id,
            filter.status.map(|s| s.as_str()),
            filter.limit.unwrap_or(50),
        ],
        |row| Ok(parse_appointment_row(row)),
    )?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

/// Active appointments of a staff member whose interval overlaps `[from, to)`.
pub fn active_appointments_overlapping(
    conn: &Connection,
    staff_id: &str,
    from: &NaiveDateTime,
    to: &NaiveDateTime,
) -> anyhow::Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE staff_id = ?1 AND status IN ('PENDING', 'CONFIRMED')
           AND starts_at < ?3 AND ends_at > ?2
         ORDER BY starts_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![staff_id, format_ts(from), format_ts(to)], |row| {
        Ok(parse_appointment_row(row))
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

/// Active appointments of a staff member starting at or after `now`.
pub fn future_active_appointments(
    conn: &Connection,
    staff_id: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE staff_id = ?1 AND status IN ('PENDING', 'CONFIRMED') AND starts_at >= ?2
         ORDER BY starts_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![staff_id, format_ts(now)], |row| {
        Ok(parse_appointment_row(row))
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
    cancelled_by: Option<&str>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, cancelled_by = COALESCE(?2, cancelled_by), updated_at = ?3
         WHERE id = ?4",
        params![status.as_str(), cancelled_by, now_str(), id],
    )?;
    Ok(count > 0)
}

/// Moves an appointment to `RESCHEDULE_PENDING`, optionally releasing its staff.
pub fn mark_reschedule_pending(conn: &Connection, id: &str, release_staff: bool) -> anyhow::Result<bool> {
    let sql = if release_staff {
        "UPDATE appointments SET status = 'RESCHEDULE_PENDING', staff_id = NULL, updated_at = ?1
         WHERE id = ?2 AND status IN ('PENDING', 'CONFIRMED')"
    } else {
        "UPDATE appointments SET status = 'RESCHEDULE_PENDING', updated_at = ?1
         WHERE id = ?2 AND status IN ('PENDING', 'CONFIRMED')"
    };
    let count = conn.execute(sql, params![now_str(), id])?;
    Ok(count > 0)
}

pub fn update_appointment_schedule(
    conn: &Connection,
    id: &str,
    staff_id: &str,
    starts_at: &NaiveDateTime,
    ends_at: &NaiveDateTime,
    status: AppointmentStatus,
) -> anyhow::Result<bool> {
    let count = conn
        .execute(
            "UPDATE appointments SET staff_id = ?1, starts_at = ?2, ends_at = ?3, status = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                staff_id,
                format_ts(starts_at),
                format_ts(ends_at),
                status.as_str(),
                now_str(),
                id,
            ],
        )
        .context("failed to update appointment schedule")?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let starts_at: String = row.get(4)?;
    let ends_at: String = row.get(5)?;
    let status: String = row.get(6)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Appointment {
        id: row.get(0)?,
        service_id: row.get(1)?,
        staff_id: row.get(2)?,
        client_id: row.get(3)?,
        starts_at: parse_ts(&starts_at)?,
        ends_at: parse_ts(&ends_at)?,
        status: AppointmentStatus::parse(&status).map_err(|e| anyhow::anyhow!("{e}"))?,
        notes: row.get(7)?,
        cancelled_by: row.get(8)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::errors::is_constraint_violation;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn seed(conn: &Connection) {
        let now = dt("2026-01-01 00:00");
        insert_staff(
            conn,
            &Staff { id: "dana".into(), name: "Dana".into(), active: true, created_at: now },
        )
        .unwrap();
        insert_service(
            conn,
            &Service {
                id: "manicure".into(),
                name: "Manicure".into(),
                duration_min: 60,
                price_cents: 3500,
                active: true,
                created_at: now,
            },
        )
        .unwrap();
    }

    fn appointment(id: &str, start: &str, status: AppointmentStatus) -> Appointment {
        let starts_at = dt(start);
        Appointment {
            id: id.into(),
            service_id: "manicure".into(),
            staff_id: Some("dana".into()),
            client_id: "client-1".into(),
            starts_at,
            ends_at: starts_at + chrono::Duration::minutes(60),
            status,
            notes: None,
            cancelled_by: None,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    #[test]
    fn test_timestamp_format_keeps_milliseconds() {
        let ts = NaiveDateTime::parse_from_str("2026-03-02 23:59:59.999", "%Y-%m-%d %H:%M:%S%.3f")
            .unwrap();
        assert_eq!(format_ts(&ts), "2026-03-02 23:59:59.999");
        assert_eq!(parse_ts(&format_ts(&ts)).unwrap(), ts);
        assert_eq!(parse_ts("2026-03-02 10:00:00").unwrap(), dt("2026-03-02 10:00"));
    }

    #[test]
    fn test_unique_index_rejects_second_active_booking_at_same_start() {
        let conn = db::init_db(":memory:").unwrap();
        seed(&conn);
        insert_appointment(&conn, &appointment("a1", "2026-03-02 10:00", AppointmentStatus::Pending))
            .unwrap();

        let err = insert_appointment(
            &conn,
            &appointment("a2", "2026-03-02 10:00", AppointmentStatus::Confirmed),
        )
        .unwrap_err();
        assert!(is_constraint_violation(&err));

        // Inactive rows do not hold the slot.
        insert_appointment(&conn, &appointment("a3", "2026-03-02 10:00", AppointmentStatus::Cancelled))
            .unwrap();
    }

    #[test]
    fn test_active_overlap_query_excludes_touching_and_inactive() {
        let conn = db::init_db(":memory:").unwrap();
        seed(&conn);
        insert_appointment(&conn, &appointment("a1", "2026-03-02 09:00", AppointmentStatus::Confirmed))
            .unwrap();
        insert_appointment(&conn, &appointment("a2", "2026-03-02 11:00", AppointmentStatus::Cancelled))
            .unwrap();
        insert_appointment(&conn, &appointment("a3", "2026-03-02 12:00", AppointmentStatus::Pending))
            .unwrap();

        let hits = active_appointments_overlapping(
            &conn,
            "dana",
            &dt("2026-03-02 10:00"),
            &dt("2026-03-02 12:30"),
        )
        .unwrap();
        let ids: Vec<_> = hits.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a3"]);
    }

    #[test]
    fn test_deleting_staff_keeps_historical_appointments() {
        let conn = db::init_db(":memory:").unwrap();
        seed(&conn);
        insert_appointment(&conn, &appointment("a1", "2026-03-02 09:00", AppointmentStatus::Completed))
            .unwrap();

        assert!(delete_staff(&conn, "dana").unwrap());
        assert!(get_staff(&conn, "dana").unwrap().is_none());
        let appt = get_appointment(&conn, "a1").unwrap().unwrap();
        assert_eq!(appt.staff_id.as_deref(), Some("dana"));
        assert_eq!(appt.status, AppointmentStatus::Completed);
    }

    #[test]
    fn test_list_appointments_filters_by_status() {
        let conn = db::init_db(":memory:").unwrap();
        seed(&conn);
        insert_appointment(&conn, &appointment("a1", "2026-03-02 09:00", AppointmentStatus::Pending))
            .unwrap();
        insert_appointment(&conn, &appointment("a2", "2026-03-02 11:00", AppointmentStatus::Cancelled))
            .unwrap();

        let filter = AppointmentFilter {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };
        let found = list_appointments(&conn, &filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a2");
        assert_eq!(list_appointments(&conn, &AppointmentFilter::default()).unwrap().len(), 2);
    }
}

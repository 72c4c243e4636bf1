use chrono::Local;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Service, Staff};
use crate::services::calendar::MINUTES_PER_DAY;

pub fn create_staff(conn: &Connection, name: &str) -> Result<Staff, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("staff name must not be empty"));
    }

    let staff = Staff {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        active: true,
        created_at: Local::now().naive_local(),
    };
    queries::insert_staff(conn, &staff)?;
    tracing::info!(staff_id = %staff.id, name = %staff.name, "staff created");
    Ok(staff)
}

pub fn create_service(
    conn: &Connection,
    name: &str,
    duration_min: i64,
    price_cents: i64,
) -> Result<Service, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("service name must not be empty"));
    }
    if duration_min <= 0 || duration_min > MINUTES_PER_DAY {
        return Err(AppError::validation(format!(
            "service duration must be between 1 and {MINUTES_PER_DAY} minutes"
        )));
    }
    if price_cents < 0 {
        return Err(AppError::validation("service price must not be negative"));
    }

    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        duration_min,
        price_cents,
        active: true,
        created_at: Local::now().naive_local(),
    };
    queries::insert_service(conn, &service)?;
    tracing::info!(service_id = %service.id, duration_min, "service created");
    Ok(service)
}

pub fn assign_service(conn: &Connection, staff_id: &str, service_id: &str) -> Result<(), AppError> {
    require_staff(conn, staff_id)?;
    require_service(conn, service_id)?;
    queries::assign_service(conn, staff_id, service_id)?;
    Ok(())
}

pub fn require_staff(conn: &Connection, staff_id: &str) -> Result<Staff, AppError> {
    queries::get_staff(conn, staff_id)?.ok_or_else(|| AppError::not_found("staff", staff_id))
}

pub fn require_service(conn: &Connection, service_id: &str) -> Result<Service, AppError> {
    queries::get_service(conn, service_id)?.ok_or_else(|| AppError::not_found("service", service_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_create_service_validates_duration_and_price() {
        let conn = db::init_db(":memory:").unwrap();
        assert!(matches!(create_service(&conn, "Cut", 0, 100), Err(AppError::Validation(_))));
        assert!(matches!(create_service(&conn, "Cut", 24 * 60 + 1, 100), Err(AppError::Validation(_))));
        assert!(matches!(
            create_service(&conn, "Cut", 1_000_000_000_000, 100),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(create_service(&conn, "Cut", 30, -1), Err(AppError::Validation(_))));
        assert!(matches!(create_service(&conn, "  ", 30, 100), Err(AppError::Validation(_))));

        create_service(&conn, "Full day", 24 * 60, 0).unwrap();
        let svc = create_service(&conn, "Cut", 30, 2500).unwrap();
        assert_eq!(require_service(&conn, &svc.id).unwrap().duration_min, 30);
    }

    #[test]
    fn test_assign_service_is_idempotent() {
        let conn = db::init_db(":memory:").unwrap();
        let staff = create_staff(&conn, "Dana").unwrap();
        let svc = create_service(&conn, "Manicure", 60, 3500).unwrap();

        assign_service(&conn, &staff.id, &svc.id).unwrap();
        assign_service(&conn, &staff.id, &svc.id).unwrap();

        let qualified = queries::qualified_staff(&conn, &svc.id).unwrap();
        assert_eq!(qualified.len(), 1);
        assert!(matches!(
            assign_service(&conn, &staff.id, "missing"),
            Err(AppError::NotFound(_))
        ));
    }
}

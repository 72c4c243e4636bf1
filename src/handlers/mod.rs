pub mod appointments;
pub mod availability;
pub mod catalog;
pub mod health;
pub mod staff;

use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/availability", get(availability::get_availability))
        .route(
            "/api/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/api/appointments/:id",
            get(appointments::get_appointment).delete(appointments::cancel_appointment),
        )
        .route("/api/appointments/:id/status", patch(appointments::update_status))
        .route("/api/appointments/:id/reschedule", post(appointments::reschedule))
        .route("/api/services", get(catalog::list_services).post(catalog::create_service))
        .route("/api/staff", get(staff::list_staff).post(staff::create_staff))
        .route("/api/staff/:id", delete(staff::delete_staff))
        .route("/api/staff/:id/services", post(staff::assign_service))
        .route(
            "/api/staff/:id/working-hours",
            get(staff::list_working_hours).post(staff::add_working_hours),
        )
        .route(
            "/api/staff/:id/time-off",
            get(staff::list_time_off).post(staff::create_time_off),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

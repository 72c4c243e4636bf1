use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Service;
use crate::services::catalog;
use crate::state::AppState;

// GET /api/services
pub async fn list_services(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Service>>, AppError> {
    let services = {
        let db = state.conn()?;
        queries::list_services(&db)?
    };
    Ok(Json(services))
}

// POST /api/services
#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub duration_min: i64,
    #[serde(default)]
    pub price_cents: i64,
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    let service = {
        let db = state.conn()?;
        catalog::create_service(&db, &body.name, body.duration_min, body.price_cents)?
    };
    Ok((StatusCode::CREATED, Json(service)))
}

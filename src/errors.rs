use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rusqlite::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("slot conflict: {0}")]
    SlotConflict(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        AppError::NotFound(format!("{what} {id}"))
    }

    /// Collapses any failure inside a cascade into `OperationFailed`, keeping
    /// caller-facing lookups (`NotFound`, `Validation`) intact.
    pub fn into_cascade_failure(self) -> Self {
        match self {
            AppError::NotFound(_) | AppError::Validation(_) | AppError::OperationFailed(_) => self,
            other => AppError::OperationFailed(other.to_string()),
        }
    }
}

/// True when a storage error was raised by a UNIQUE or CHECK constraint.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation
        )
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::SlotConflict(_) => StatusCode::CONFLICT,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

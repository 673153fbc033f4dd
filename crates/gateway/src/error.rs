//! Error types for the gateway.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use collector::CollectorError;
use database::{DatabaseError, ValidationError};
use thiserror::Error;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The submission failed validation.
    #[error("Failed to validate: {0}")]
    Validation(#[from] ValidationError),

    /// The request body is not a JSON submission.
    #[error("Malformed request body: {}", .0.body_text())]
    MalformedBody(#[from] JsonRejection),

    /// The requested transaction does not exist.
    #[error("Transaction does not exist")]
    NotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for GatewayError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { id, .. } => GatewayError::NotFound(id),
            other => GatewayError::Database(other),
        }
    }
}

impl From<CollectorError> for GatewayError {
    fn from(err: CollectorError) -> Self {
        match err {
            CollectorError::Validation(e) => GatewayError::Validation(e),
            CollectorError::Database(e) => e.into(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, body) = match &self {
            GatewayError::Validation(err) => {
                tracing::info!(code = %err.code(), "Rejected submission: {}", err);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    serde_json::json!({
                        "status": "error",
                        "code": err.code(),
                        "message": message,
                    }),
                )
            }
            GatewayError::MalformedBody(rejection) => {
                tracing::info!(
                    status = %rejection.status(),
                    "Rejected request body: {}",
                    rejection.body_text()
                );
                (
                    rejection.status(),
                    serde_json::json!({
                        "status": "error",
                        "code": "invalid:body",
                        "message": message,
                    }),
                )
            }
            GatewayError::NotFound(id) => {
                tracing::info!(id = %id, "Transaction not found");
                (
                    StatusCode::NOT_FOUND,
                    serde_json::json!({
                        "status": "error",
                        "message": message,
                    }),
                )
            }
            GatewayError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({
                        "status": "error",
                        "message": message,
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, GatewayError>;

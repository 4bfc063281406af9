use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{error::DbErr, SqlErr};
use serde::{Deserialize, Serialize};

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// JSON body returned for every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Request identifier echoed from the `x-request-id` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error was produced
    pub timestamp: String,
}

/// Every failure the cart core can report.
///
/// The set is closed: callers match on it exhaustively, and no layer inside the
/// core folds one variant into another.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Insufficient or contradictory caller input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The requested attribute combination is not in the product's catalog.
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    /// A matched variant is missing usable pricing data.
    #[error("Catalog corrupt: {0}")]
    CatalogCorrupt(String),

    /// A referenced cart, product or line item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(DbErr),
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(msg) => ServiceError::NotFound(msg),
            other => match other.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                    ServiceError::NotFound(format!("referenced row missing: {}", msg))
                }
                _ => ServiceError::StorageError(other),
            },
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::InvalidRequest(err.to_string())
    }
}

impl ServiceError {
    /// Wraps a free-form storage failure message.
    pub fn storage_message(message: impl Into<String>) -> Self {
        ServiceError::StorageError(DbErr::Custom(message.into()))
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::VariantNotFound(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::CatalogCorrupt(_) | Self::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Server-side failures return generic messages so internal state is not leaked.
    pub fn response_message(&self) -> String {
        match self {
            Self::CatalogCorrupt(_) | Self::StorageError(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// True for failures caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

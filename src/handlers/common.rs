use crate::errors::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::InvalidRequest(format!("Validation failed: {}", e)))
}

/// Offset/limit window for list operations
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
pub struct PaginationParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl PaginationParams {
    /// Applies the configured default limit and rejects limits outside
    /// `1..=max_limit`.
    pub fn resolve(&self, default_limit: u64, max_limit: u64) -> Result<(u64, u64), ServiceError> {
        let limit = self.limit.unwrap_or(default_limit);
        if limit == 0 || limit > max_limit {
            return Err(ServiceError::InvalidRequest(format!(
                "limit must be between 1 and {}",
                max_limit
            )));
        }
        Ok((self.offset.unwrap_or(0), limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_bounds() {
        let params = PaginationParams::default();
        assert_eq!(params.resolve(20, 100).unwrap(), (0, 20));

        let params = PaginationParams {
            offset: Some(40),
            limit: Some(100),
        };
        assert_eq!(params.resolve(20, 100).unwrap(), (40, 100));

        let too_big = PaginationParams {
            offset: None,
            limit: Some(101),
        };
        assert!(too_big.resolve(20, 100).is_err());

        let zero = PaginationParams {
            offset: None,
            limit: Some(0),
        };
        assert!(zero.resolve(20, 100).is_err());
    }
}

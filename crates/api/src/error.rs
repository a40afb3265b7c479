//! Error handling for API endpoints

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dockline_core::CharterError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// API error type that can be converted to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden,
    Conflict(String),
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", Some(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", Some(msg)),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", Some(msg)),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden", None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg)),
            ApiError::Internal(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

/// Convert CharterError to ApiError
impl From<CharterError> for ApiError {
    fn from(err: CharterError) -> Self {
        match err {
            CharterError::BookingNotFound(id) => {
                ApiError::NotFound(format!("Booking not found: {}", id))
            }
            CharterError::TripNotFound(id) => {
                ApiError::NotFound(format!("Group trip not found: {}", id))
            }
            CharterError::TripBookingNotFound(id) => {
                ApiError::NotFound(format!("Trip booking not found: {}", id))
            }
            CharterError::BoatNotFound(id) => ApiError::NotFound(format!("Boat not found: {}", id)),
            CharterError::InvalidBookingData(msg) => ApiError::BadRequest(msg),
            CharterError::IllegalTransition { from, to } => ApiError::Conflict(format!(
                "Status transition {} -> {} is not allowed",
                from, to
            )),
            CharterError::ConcurrentUpdate { expected } => ApiError::Conflict(format!(
                "Booking changed concurrently, expected status {}",
                expected
            )),
            CharterError::NotEnoughSeats {
                requested,
                available,
            } => ApiError::Conflict(format!(
                "Not enough seats: requested {}, available {}",
                requested, available
            )),
            CharterError::Unauthenticated(msg) => ApiError::Unauthorized(msg),
            CharterError::PermissionDenied => ApiError::Forbidden,
        }
    }
}

/// Convert sqlx errors to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Check for unique constraint violations
                if let Some(constraint) = db_err.constraint() {
                    ApiError::Conflict(format!("Constraint violation: {}", constraint))
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            success: false,
            error: "Not Found".to_string(),
            details: Some("Resource does not exist".to_string()),
        };

        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("Not Found"));
        assert!(json.contains("Resource does not exist"));
    }

    #[test]
    fn test_error_response_without_details() {
        let error = ErrorResponse {
            success: false,
            error: "Forbidden".to_string(),
            details: None,
        };

        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("Forbidden"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_booking_not_found_conversion() {
        let booking_id = Uuid::new_v4();
        let err = CharterError::BookingNotFound(booking_id);
        let api_err: ApiError = err.into();

        match api_err {
            ApiError::NotFound(msg) => assert!(msg.contains(&booking_id.to_string())),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_illegal_transition_conversion() {
        let err = CharterError::IllegalTransition {
            from: "cancelled".to_string(),
            to: "confirmed".to_string(),
        };
        let api_err: ApiError = err.into();

        match api_err {
            ApiError::Conflict(msg) => {
                assert!(msg.contains("cancelled"));
                assert!(msg.contains("confirmed"));
            }
            _ => panic!("Expected Conflict error"),
        }
    }

    #[test]
    fn test_concurrent_update_conversion() {
        let err = CharterError::ConcurrentUpdate {
            expected: "pending".to_string(),
        };
        let api_err: ApiError = err.into();

        match api_err {
            ApiError::Conflict(msg) => assert!(msg.contains("pending")),
            _ => panic!("Expected Conflict error"),
        }
    }

    #[test]
    fn test_permission_denied_conversion() {
        let err = CharterError::PermissionDenied;
        let api_err: ApiError = err.into();

        match api_err {
            ApiError::Forbidden => {}
            _ => panic!("Expected Forbidden error"),
        }
    }
}

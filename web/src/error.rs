//! Error types for booking handlers.
//!
//! [`AppError`] bridges [`BookingError`] and HTTP responses:
//!
//! | Kind             | Status                         |
//! |------------------|--------------------------------|
//! | `NotFound`       | 404 Not Found                  |
//! | `InvalidState`   | 422 Unprocessable Entity       |
//! | `Conflict`       | 409 Conflict                   |
//! | `Infrastructure` | 503 if unavailable, 500 otherwise |
//!
//! The body is always `{"code": ..., "message": ...}` where `code` is the
//! stable [`BookingError::code`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use studio_booking_core::{BookingError, ErrorKind, StoreError};

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = %source,
                    "Booking request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Booking request failed"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(error: BookingError) -> Self {
        let code = error.code();
        match error.kind() {
            ErrorKind::NotFound => Self::new(StatusCode::NOT_FOUND, error.to_string(), code),
            ErrorKind::InvalidState => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, error.to_string(), code)
            },
            ErrorKind::Conflict => Self::new(StatusCode::CONFLICT, error.to_string(), code),
            ErrorKind::Infrastructure => {
                let status = if matches!(error, BookingError::Store(StoreError::Unavailable(_))) {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                Self::new(status, "An internal error occurred", code).with_source(error.into())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_booking_core::{MemberId, ReservationId, ReservationStatus, SessionId};

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("from must be before to");
        assert_eq!(err.to_string(), "[BAD_REQUEST] from must be before to");
    }

    #[test]
    fn test_full_maps_to_conflict() {
        let err = AppError::from(BookingError::Full {
            session_id: SessionId::new(),
            capacity: 2,
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "FULL");
    }

    #[test]
    fn test_not_found_and_invalid_state() {
        let err = AppError::from(BookingError::MemberNotFound(MemberId::new()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = AppError::from(BookingError::AlreadyTerminal {
            reservation_id: ReservationId::new(),
            status: ReservationStatus::Cancelled,
        });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "ALREADY_TERMINAL");
    }

    #[test]
    fn test_store_errors_hide_details() {
        let err = AppError::from(BookingError::Store(StoreError::Database(
            "relation \"reservations\" does not exist".into(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("relation"));

        let err = AppError::from(BookingError::Store(StoreError::Unavailable("pool".into())));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

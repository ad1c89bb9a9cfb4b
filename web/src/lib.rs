//! HTTP surface for class bookings.
//!
//! Thin Axum shell over [`studio_booking_core::BookingService`]: handlers
//! parse the request, call one service operation and map the result.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at Axum handler
//! 2. **Extract** typed IDs from the path and the JSON body
//! 3. **Call** the booking service
//! 4. **Map** [`studio_booking_core::BookingError`] to a status via [`AppError`]
//! 5. **Return** JSON
//!
//! # Example
//!
//! ```ignore
//! use studio_booking_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(service));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use router::{REQUEST_ID_HEADER, build_router};
pub use state::{AlwaysReady, AppState, ReadinessProbe};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

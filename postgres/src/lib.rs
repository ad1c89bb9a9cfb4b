//! `PostgreSQL` storage for class bookings.
//!
//! This crate provides [`PostgresBookingStore`], which implements the
//! `SessionCatalog`, `ReservationStore` and `ReservationQuery` traits from
//! `studio-booking-core`. It uses sqlx and supports:
//!
//! - Race-free admission via a session row lock
//! - A partial unique index as the duplicate-booking backstop
//! - Embedded migrations (`migrations/`)
//! - Connection pooling
//!
//! # Example
//!
//! ```ignore
//! use studio_booking_postgres::PostgresBookingStore;
//! use studio_booking_core::BookingService;
//! use std::sync::Arc;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = sqlx::PgPool::connect("postgres://localhost/booking").await?;
//!     let store = PostgresBookingStore::new(pool);
//!     store.migrate().await?;
//!     let service = BookingService::new(Arc::new(store));
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;
mod store;

pub use store::PostgresBookingStore;

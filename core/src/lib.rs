//! # Studio Booking Core
//!
//! Booking-and-capacity rules for fitness-class sessions.
//!
//! This crate owns the one part of the scheduling service where a
//! cross-request invariant has to hold: a session never admits more members
//! than it has seats, no matter how many requests race for the last one.
//!
//! ## Core Concepts
//!
//! - **Session**: one scheduled occurrence of a class, with a fixed capacity
//! - **Reservation**: one member's claim on one seat of one session
//! - **Occupancy**: number of reservations currently holding a seat
//! - **Capacity Gate**: the admission decision, evaluated inside the store's
//!   serializing transaction ([`capacity`])
//! - **Lifecycle**: the closed state machine every status change goes through
//!   ([`lifecycle`])
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │              BookingService                │  ← tracing, metrics, events
//! ├────────────────────────────────────────────┤
//! │  capacity::AdmissionCheck   lifecycle::apply│  ← pure decisions
//! ├────────────────────────────────────────────┤
//! │ SessionCatalog  ReservationStore  Query     │  ← traits (Postgres, in-memory)
//! └────────────────────────────────────────────┘
//! ```
//!
//! Stores never decide anything themselves. They lock, load a snapshot, ask
//! the pure functions in this crate for a verdict, and then write (or not)
//! in the same transaction.
//!
//! ## Example
//!
//! ```ignore
//! use studio_booking_core::{BookingService, Outcome};
//!
//! let service = BookingService::new(store);
//!
//! let reservation = service.request_reservation(member_id, session_id).await?;
//! service.set_outcome(reservation.id, Outcome::Attended).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capacity;
pub mod environment;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod metrics;
pub mod query;
pub mod service;
pub mod store;
pub mod types;

pub use capacity::{AdmissionCheck, Availability};
pub use environment::{Clock, SystemClock};
pub use error::{BookingError, ErrorKind, Result, StoreError};
pub use events::{BookingEvent, BookingEventSink, PublishError, TracingEventSink};
pub use lifecycle::Transition;
pub use query::{MemberReservation, ReservationQuery, RosterEntry};
pub use service::BookingService;
pub use store::{ReservationStore, SessionCatalog};
pub use types::*;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
